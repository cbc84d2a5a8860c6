//! Доменные модели: нормализованный билан и ключ схемы.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ключ запроса к схеме: тип билана + код строки liasse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub document_type: String,
    pub line_code: String,
}

impl LineKey {
    pub fn new(document_type: impl Into<String>, line_code: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            line_code: line_code.into(),
        }
    }
}

/// Один декодированный билан.
///
/// Даты равны `None`, если их не удалось разобрать; причина в этом случае
/// лежит в `report`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Bilan {
    pub reference: String,

    pub siren: String,
    pub adresse: String,
    pub code_greffe: String,
    pub num_depot: String,
    pub num_gestion: String,
    pub code_activite: String,
    pub date_cloture_exercice: Option<NaiveDate>,
    pub date_cloture_exercice_precedent: Option<NaiveDate>,
    pub duree_exercice: String,
    pub duree_exercice_precedent: String,
    pub date_depot: Option<NaiveDate>,
    pub code_motif: String,
    pub code_type_bilan: String,
    pub code_devise: String,
    pub code_origine_devise: String,
    pub code_confidentialite: String,
    pub denomination: String,
    pub info_traitement: String,

    #[serde(with = "lossy_text")]
    pub raw_source: Vec<u8>,

    pub lignes: BTreeMap<String, Decimal>,
    pub report: Vec<String>,
}

impl Bilan {
    /// `true`, если при декодировании не было ни одного предупреждения.
    pub fn is_clean(&self) -> bool {
        self.report.is_empty()
    }
}

// исходный XML в JSON пишем строкой, а не массивом байт
mod lossy_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(d).map(String::into_bytes)
    }
}
