//! Структурированные «мягкие» сбои обхода и отмена.
//!
//! Ни одно из этих событий не прерывает поток биланов: затронутый каталог,
//! файл или архив просто выпадает из выдачи.

use crate::traits::EventSink;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Каталог не удалось прочитать (права, отсутствует).
    DirUnreadable { path: PathBuf, error: String },
    /// Отдельная запись листинга каталога не читается.
    DirEntryUnreadable { path: PathBuf, error: String },
    FileUnreadable { path: PathBuf, error: String },
    /// Данные не являются корректным zip.
    CorruptArchive { name: String, error: String },
    EntryUnreadable {
        archive: String,
        entry: String,
        error: String,
    },
    NestingTooDeep { name: String, depth: usize },
    /// Лист подошёл по расширению, но его содержимое не прочиталось.
    SourceUnreadable { reference: String, error: String },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::DirUnreadable { path, error } => {
                write!(f, "{}: directory unreadable, skipped ({error})", path.display())
            }
            Event::DirEntryUnreadable { path, error } => {
                write!(f, "{}: directory entry unreadable ({error})", path.display())
            }
            Event::FileUnreadable { path, error } => {
                write!(f, "{}: cannot open file ({error})", path.display())
            }
            Event::CorruptArchive { name, error } => {
                write!(f, "{name}: not a valid zip archive ({error})")
            }
            Event::EntryUnreadable {
                archive,
                entry,
                error,
            } => write!(f, "{archive} > {entry}: cannot open entry ({error})"),
            Event::NestingTooDeep { name, depth } => {
                write!(f, "{name}: archive nesting depth {depth} exceeds limit, skipped")
            }
            Event::SourceUnreadable { reference, error } => {
                write!(f, "{reference}: cannot read document ({error})")
            }
        }
    }
}

/// Приёмник по умолчанию: пишет события в `log` уровнем warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: Event) {
        log::warn!("{event}");
    }
}

/// Флаг отмены, разделяемый между потребителем и итераторами обхода.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
