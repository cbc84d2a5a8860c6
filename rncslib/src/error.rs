//! Единый тип ошибок публичного API.
//!
//! Внутри конвейера ошибки не всплывают к вызывающему: они превращаются
//! либо в строки `report` записи, либо в [`crate::events::Event`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RncsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Schema error: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, RncsError>;
