#![allow(dead_code)]

use rncslib::{model::LineKey, schema::SchemaTable};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Zip в памяти; записи идут в переданном порядке.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(data).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Документ с валидными датами и переданными строками `<liasse .../>`.
pub fn bilan_doc(siren: &str, liasses: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<bilans>
  <bilan>
    <identite>
      <siren>{siren}</siren>
      <adresse>1 RUE DE LA PAIX 75002 PARIS</adresse>
      <code_greffe>7501</code_greffe>
      <num_depot>12345</num_depot>
      <num_gestion>2001B00001</num_gestion>
      <code_activite>6201Z</code_activite>
      <date_cloture_exercice>20231231</date_cloture_exercice>
      <date_cloture_exercice_precedent>20221231</date_cloture_exercice_precedent>
      <duree_exercice>012</duree_exercice>
      <duree_exercice_precedent>012</duree_exercice_precedent>
      <date_depot>20240615</date_depot>
      <code_motif>00</code_motif>
      <code_type_bilan>C</code_type_bilan>
      <code_devise>EUR</code_devise>
      <code_origine_devise>EUR</code_origine_devise>
      <code_confidentialite>0</code_confidentialite>
      <denomination>ACME SAS</denomination>
      <info_traitement>saisie</info_traitement>
    </identite>
    <detail>
      <page numero="01">
        {liasses}
      </page>
    </detail>
  </bilan>
</bilans>"#
    )
}

pub fn schema() -> SchemaTable {
    let slots = |a: &str, b: &str, c: &str, d: &str| [a.to_string(), b.to_string(), c.to_string(), d.to_string()];
    [
        (LineKey::new("C", "AA"), slots("capital_souscrit", "", "", "")),
        (LineKey::new("C", "AB"), slots("frais_brut", "frais_amort", "frais_net", "frais_net_n1")),
        (LineKey::new("C", "FL"), slots("chiffre_affaires", "", "", "chiffre_affaires_n1")),
        (LineKey::new("C", "HN"), slots("resultat", "", "", "")),
        (LineKey::new("C", "ZZ"), slots("resultat", "", "", "")),
    ]
    .into_iter()
    .collect()
}
