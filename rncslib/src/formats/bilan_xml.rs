//! XML билана RNCS: <bilans><bilan><identite/><detail><page><liasse/>...</detail></bilan></bilans>
//!
//! Разбор «терпимый»: неизвестные элементы игнорируются, битый документ
//! даёт пустое дерево, а все проблемы уходят в `report`, а не в ошибку.

use crate::{
    model::{Bilan, LineKey},
    traits::SchemaResolver,
};
use chrono::NaiveDate;
use quick_xml::de::from_reader;
use rust_decimal::Decimal;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

pub const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct XmlBilans {
    bilan: XmlBilan,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct XmlBilan {
    identite: XmlIdentite,
    detail: XmlDetail,
}

// Повторный элемент перезаписывает предыдущий, неизвестные пропускаются,
// поэтому Deserialize написан руками, а не выведен.
#[derive(Debug, Default)]
struct XmlIdentite {
    siren: String,
    adresse: String,
    code_greffe: String,
    num_depot: String,
    num_gestion: String,
    code_activite: String,
    date_cloture_exercice: String,
    date_cloture_exercice_precedent: String,
    duree_exercice: String,
    duree_exercice_precedent: String,
    date_depot: String,
    code_motif: String,
    code_type_bilan: String,
    code_devise: String,
    code_origine_devise: String,
    code_confidentialite: String,
    denomination: String,
    info_traitement: String,
}

impl XmlIdentite {
    fn slot(&mut self, element: &str) -> Option<&mut String> {
        Some(match element {
            "siren" => &mut self.siren,
            "adresse" => &mut self.adresse,
            "code_greffe" => &mut self.code_greffe,
            "num_depot" => &mut self.num_depot,
            "num_gestion" => &mut self.num_gestion,
            "code_activite" => &mut self.code_activite,
            "date_cloture_exercice" => &mut self.date_cloture_exercice,
            "date_cloture_exercice_precedent" => &mut self.date_cloture_exercice_precedent,
            "duree_exercice" => &mut self.duree_exercice,
            "duree_exercice_precedent" => &mut self.duree_exercice_precedent,
            "date_depot" => &mut self.date_depot,
            "code_motif" => &mut self.code_motif,
            "code_type_bilan" => &mut self.code_type_bilan,
            "code_devise" => &mut self.code_devise,
            "code_origine_devise" => &mut self.code_origine_devise,
            "code_confidentialite" => &mut self.code_confidentialite,
            "denomination" => &mut self.denomination,
            "info_traitement" => &mut self.info_traitement,
            _ => return None,
        })
    }
}

impl<'de> Deserialize<'de> for XmlIdentite {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_map(IdentiteVisitor)
    }
}

struct IdentiteVisitor;

impl<'de> Visitor<'de> for IdentiteVisitor {
    type Value = XmlIdentite;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an <identite> block")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<XmlIdentite, A::Error> {
        let mut id = XmlIdentite::default();
        while let Some(key) = map.next_key::<String>()? {
            match id.slot(&key) {
                Some(slot) => *slot = map.next_value()?,
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(id)
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct XmlDetail {
    #[serde(rename = "page")]
    pages: Vec<XmlPage>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct XmlPage {
    #[serde(rename = "liasse")]
    liasses: Vec<XmlLiasse>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct XmlLiasse {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@m1")]
    m1: Option<String>,
    #[serde(rename = "@m2")]
    m2: Option<String>,
    #[serde(rename = "@m3")]
    m3: Option<String>,
    #[serde(rename = "@m4")]
    m4: Option<String>,
}

impl XmlLiasse {
    fn values(&self) -> [Option<&str>; 4] {
        [&self.m1, &self.m2, &self.m3, &self.m4].map(|m| m.as_deref())
    }
}

/// Декодирует один документ. Никогда не падает: всё, что не удалось
/// разобрать, описывается строкой в `report`.
pub fn decode(bytes: Vec<u8>, reference: impl Into<String>, resolver: &dyn SchemaResolver) -> Bilan {
    let mut report = Vec::new();

    let x: XmlBilans = match from_reader(bytes.as_slice()) {
        Ok(x) => x,
        Err(e) => {
            report.push(format!("xml: {e}"));
            XmlBilans::default()
        }
    };
    let XmlBilan { identite: id, detail } = x.bilan;

    let mut date = |field: &str, raw: &str| match parse_date(raw) {
        Ok(d) => Some(d),
        Err(e) => {
            report.push(format!("{field}: {e}"));
            None
        }
    };
    let date_cloture_exercice = date("dateClotureExercice", &id.date_cloture_exercice);
    let date_cloture_exercice_precedent =
        date("dateClotureExercicePrecedent", &id.date_cloture_exercice_precedent);
    let date_depot = date("dateDepot", &id.date_depot);

    let mut bilan = Bilan {
        reference: reference.into(),
        siren: id.siren,
        adresse: id.adresse,
        code_greffe: id.code_greffe,
        num_depot: id.num_depot,
        num_gestion: id.num_gestion,
        code_activite: id.code_activite,
        date_cloture_exercice,
        date_cloture_exercice_precedent,
        duree_exercice: id.duree_exercice,
        duree_exercice_precedent: id.duree_exercice_precedent,
        date_depot,
        code_motif: id.code_motif,
        code_type_bilan: id.code_type_bilan,
        code_devise: id.code_devise,
        code_origine_devise: id.code_origine_devise,
        code_confidentialite: id.code_confidentialite,
        denomination: id.denomination,
        info_traitement: id.info_traitement,
        raw_source: bytes,
        report,
        ..Bilan::default()
    };

    for page in &detail.pages {
        for liasse in &page.liasses {
            map_liasse(&mut bilan, liasse, resolver);
        }
    }
    bilan
}

/// Строго 8 цифр: chrono сам по себе примет и `2024061` как 2024-06-01.
fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected 8-digit YYYYMMDD, got {raw:?}"));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| e.to_string())
}

fn map_liasse(bilan: &mut Bilan, liasse: &XmlLiasse, resolver: &dyn SchemaResolver) {
    let key = LineKey::new(bilan.code_type_bilan.as_str(), liasse.code.as_str());
    let Some(slots) = resolver.resolve(&key) else {
        bilan.report.push(format!("Code liasse non identifié: {}", key.line_code));
        return;
    };

    for (n, (name, raw)) in slots.iter().zip(liasse.values()).enumerate() {
        let Some(raw) = raw.filter(|_| !name.is_empty()) else {
            continue;
        };
        match raw.trim().parse::<Decimal>() {
            // последняя строка с тем же именем поля выигрывает
            Ok(v) => {
                bilan.lignes.insert(name.clone(), v);
            }
            Err(e) => bilan.report.push(format!("{}.m{}: {e}", liasse.code, n + 1)),
        }
    }
}
