//! Таблица схемы liasse из CSV: заголовки
//! document_type,line_code,m1,m2,m3,m4
//!
//! Пустая ячейка m* означает, что слот для этого кода не используется.

use crate::{
    error::{RncsError, Result},
    model::LineKey,
    traits::{SchemaResolver, Slots},
};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(serde::Deserialize)]
struct SchemaRow {
    document_type: String,
    line_code: String,
    m1: Option<String>,
    m2: Option<String>,
    m3: Option<String>,
    m4: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    slots: HashMap<LineKey, Slots>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Повторный ключ перезаписывает предыдущую строку.
    pub fn from_reader<R: Read>(r: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(r);
        let mut table = Self::new();

        for rec in rdr.deserialize::<SchemaRow>() {
            let row = rec?;
            if row.line_code.is_empty() {
                return Err(RncsError::Schema(format!(
                    "empty line_code for document type {:?}",
                    row.document_type
                )));
            }
            let slot = |v: Option<String>| v.unwrap_or_default();
            table.insert(
                LineKey::new(row.document_type, row.line_code),
                [slot(row.m1), slot(row.m2), slot(row.m3), slot(row.m4)],
            );
        }
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn insert(&mut self, key: LineKey, slots: Slots) -> Option<Slots> {
        self.slots.insert(key, slots)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl SchemaResolver for SchemaTable {
    fn resolve(&self, key: &LineKey) -> Option<&Slots> {
        self.slots.get(key)
    }
}

impl FromIterator<(LineKey, Slots)> for SchemaTable {
    fn from_iter<I: IntoIterator<Item = (LineKey, Slots)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}
