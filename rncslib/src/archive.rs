//! Рекурсивная распаковка вложенных zip без распаковки всего дерева.
//!
//! [`expand`] возвращает ленивый итератор листьев: zip внутри zip
//! разворачиваются в глубину, в порядке центрального каталога архива.
//! Содержимое листа распаковывается только при первом чтении.

use crate::{
    error::{Result, RncsError},
    events::{CancelToken, Event},
};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use zip::ZipArchive;

/// Суффикс контейнера. Сравнение регистрозависимое: `REPORT.ZIP` — обычный лист.
pub const ARCHIVE_SUFFIX: &str = "zip";

/// Предел вложенности zip; внешний архив имеет глубину 1.
pub const MAX_NESTING_DEPTH: usize = 10;

pub fn is_archive(name: &str) -> bool {
    name.ends_with(ARCHIVE_SUFFIX)
}

type Archive = ZipArchive<Cursor<Arc<[u8]>>>;

/// Именованный поток байт, владеющий своим дескриптором.
pub struct NamedSource {
    pub name: String,
    /// Имена архивов, внутри которых лежал источник, от внешнего к внутреннему.
    pub parents: Vec<String>,
    pub reader: Box<dyn Read + Send>,
}

impl NamedSource {
    pub fn new(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            reader: Box::new(reader),
        }
    }

    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for NamedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedSource")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .finish_non_exhaustive()
    }
}

/// Читатель записи zip: распаковывает запись при первом `read`.
struct EntryReader {
    archive: Archive,
    index: usize,
    inflated: Option<Cursor<Vec<u8>>>,
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.inflated.is_none() {
            let mut entry = self.archive.by_index(self.index).map_err(io::Error::other)?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            self.inflated = Some(Cursor::new(data));
        }
        match self.inflated.as_mut() {
            Some(c) => c.read(buf),
            None => Ok(0),
        }
    }
}

/// Открытый архив на стеке обхода.
struct Frame {
    archive: Archive,
    /// Цепочка имён до этого архива включительно.
    lineage: Vec<String>,
    depth: usize,
    next: usize,
}

enum Step {
    Skip,
    Failed(Event),
    Nested {
        bytes: io::Result<Vec<u8>>,
        lineage: Vec<String>,
        depth: usize,
    },
    Leaf(NamedSource),
}

impl Frame {
    fn open_entry(&mut self, index: usize) -> Step {
        let hint = self.archive.name_for_index(index).unwrap_or_default().to_string();
        let mut entry = match self.archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                return Step::Failed(Event::EntryUnreadable {
                    archive: self.lineage.join(" > "),
                    entry: hint,
                    error: e.to_string(),
                })
            }
        };
        if entry.is_dir() {
            return Step::Skip;
        }
        let name = entry.name().to_string();
        let mut lineage = self.lineage.clone();

        if is_archive(&name) {
            let mut data = Vec::new();
            let bytes = entry.read_to_end(&mut data).map(|_| data);
            lineage.push(name);
            return Step::Nested {
                bytes,
                lineage,
                depth: self.depth + 1,
            };
        }
        drop(entry);

        Step::Leaf(NamedSource {
            name,
            parents: lineage,
            reader: Box::new(EntryReader {
                archive: self.archive.clone(),
                index,
                inflated: None,
            }),
        })
    }
}

/// Ленивая последовательность листьев одного источника.
///
/// Мягкие сбои (битый архив, нечитаемая запись, слишком глубокая
/// вложенность) копятся в очереди событий, см. [`Expansion::take_events`].
pub struct Expansion {
    passthrough: Option<NamedSource>,
    stack: Vec<Frame>,
    events: VecDeque<Event>,
    max_depth: usize,
    cancel: Option<CancelToken>,
}

/// Разворачивает источник с пределом вложенности по умолчанию.
pub fn expand(source: NamedSource) -> Expansion {
    Expansion::new(source, MAX_NESTING_DEPTH, None)
}

impl Expansion {
    pub fn new(source: NamedSource, max_depth: usize, cancel: Option<CancelToken>) -> Self {
        let mut this = Self {
            passthrough: None,
            stack: Vec::new(),
            events: VecDeque::new(),
            max_depth,
            cancel,
        };
        if !is_archive(&source.name) {
            this.passthrough = Some(source);
            return this;
        }

        let mut lineage = source.parents.clone();
        lineage.push(source.name.clone());
        this.push_archive(source.read_all(), lineage, 1);
        this
    }

    /// Забирает накопленные события.
    pub fn take_events(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.events.drain(..)
    }

    fn push_archive(&mut self, bytes: io::Result<Vec<u8>>, lineage: Vec<String>, depth: usize) {
        let name = lineage.join(" > ");
        if depth > self.max_depth {
            self.events.push_back(Event::NestingTooDeep { name, depth });
            return;
        }
        match bytes.map_err(RncsError::from).and_then(open_archive) {
            Ok(archive) => self.stack.push(Frame {
                archive,
                lineage,
                depth,
                next: 0,
            }),
            Err(e) => self.events.push_back(Event::CorruptArchive {
                name,
                error: e.to_string(),
            }),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

impl Iterator for Expansion {
    type Item = NamedSource;

    fn next(&mut self) -> Option<NamedSource> {
        loop {
            if self.cancelled() {
                self.passthrough = None;
                self.stack.clear();
                return None;
            }
            if let Some(source) = self.passthrough.take() {
                return Some(source);
            }
            let frame = self.stack.last_mut()?;
            if frame.next >= frame.archive.len() {
                self.stack.pop();
                continue;
            }
            let index = frame.next;
            frame.next += 1;

            match frame.open_entry(index) {
                Step::Skip => {}
                Step::Failed(event) => self.events.push_back(event),
                Step::Nested {
                    bytes,
                    lineage,
                    depth,
                } => self.push_archive(bytes, lineage, depth),
                Step::Leaf(source) => return Some(source),
            }
        }
    }
}

fn open_archive(bytes: Vec<u8>) -> Result<Archive> {
    let data: Arc<[u8]> = Arc::from(bytes);
    Ok(ZipArchive::new(Cursor::new(data))?)
}
