//! Обход дерева каталогов: каждый файл проходит через [`crate::archive`],
//! листья с расширением xml/XML декодируются в [`Bilan`].
//!
//! Обход ленивый и в глубину: подкаталог полностью выдаётся до следующей
//! записи родителя. Состояние — явный стек листингов, поэтому брошенный
//! итератор сразу освобождает все открытые файлы и буферы архивов.

use crate::{
    archive::{Expansion, NamedSource, MAX_NESTING_DEPTH},
    events::{CancelToken, Event, LogSink},
    formats::bilan_xml,
    model::Bilan,
    traits::{EventSink, SchemaResolver},
};
use log::debug;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Расширения документов. В отличие от zip, принимаются обе формы регистра.
pub const DOCUMENT_SUFFIXES: [&str; 2] = ["xml", "XML"];

pub fn is_document(name: &str) -> bool {
    DOCUMENT_SUFFIXES.iter().any(|s| name.ends_with(s))
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub max_nesting: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_nesting: MAX_NESTING_DEPTH,
        }
    }
}

struct Listed {
    path: PathBuf,
    name: String,
    is_dir: bool,
}

/// Файл, чьи листья сейчас выдаются.
struct OpenFile {
    origin: String,
    expansion: Expansion,
}

/// Ленивый поток биланов поддерева. Создаётся через [`walk`].
pub struct Walker<'s, E = LogSink> {
    resolver: &'s dyn SchemaResolver,
    events: E,
    options: WalkOptions,
    cancel: Option<CancelToken>,
    root: Option<PathBuf>,
    dirs: Vec<std::vec::IntoIter<Listed>>,
    current: Option<OpenFile>,
}

/// Точка входа: все биланы под `root`, включая вложенные zip.
pub fn walk(root: impl AsRef<Path>, resolver: &dyn SchemaResolver) -> Walker<'_> {
    Walker {
        resolver,
        events: LogSink,
        options: WalkOptions::default(),
        cancel: None,
        root: Some(root.as_ref().to_path_buf()),
        dirs: Vec::new(),
        current: None,
    }
}

impl<'s, E: EventSink> Walker<'s, E> {
    pub fn with_events<F: EventSink>(self, events: F) -> Walker<'s, F> {
        Walker {
            resolver: self.resolver,
            events,
            options: self.options,
            cancel: self.cancel,
            root: self.root,
            dirs: self.dirs,
            current: self.current,
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Отдаёт приёмник событий, например накопленный `Vec<Event>`.
    pub fn into_events(self) -> E {
        self.events
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn release(&mut self) {
        self.root = None;
        self.dirs.clear();
        self.current = None;
    }

    fn enter_dir(&mut self, path: PathBuf) {
        debug!("{}: listing", path.display());
        let read_dir = match fs::read_dir(&path) {
            Ok(rd) => rd,
            Err(e) => {
                self.events.emit(Event::DirUnreadable {
                    path,
                    error: e.to_string(),
                });
                return;
            }
        };

        let mut listed = Vec::new();
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.events.emit(Event::DirEntryUnreadable {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            // file_type() не идёт по симлинкам: ссылка открывается как файл
            match entry.file_type() {
                Ok(ft) => listed.push(Listed {
                    path: entry.path(),
                    name: entry.file_name().to_string_lossy().into_owned(),
                    is_dir: ft.is_dir(),
                }),
                Err(e) => self.events.emit(Event::DirEntryUnreadable {
                    path: entry.path(),
                    error: e.to_string(),
                }),
            }
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        self.dirs.push(listed.into_iter());
    }

    fn open_file(&mut self, item: Listed) {
        debug!("{}: opening", item.path.display());
        match File::open(&item.path) {
            Ok(file) => {
                let source = NamedSource::new(item.name.clone(), file);
                self.current = Some(OpenFile {
                    origin: item.name,
                    expansion: Expansion::new(source, self.options.max_nesting, self.cancel.clone()),
                });
            }
            Err(e) => self.events.emit(Event::FileUnreadable {
                path: item.path,
                error: e.to_string(),
            }),
        }
    }
}

impl<E: EventSink> Iterator for Walker<'_, E> {
    type Item = Bilan;

    fn next(&mut self) -> Option<Bilan> {
        loop {
            if self.cancelled() {
                self.release();
                return None;
            }
            if let Some(root) = self.root.take() {
                self.enter_dir(root);
                continue;
            }

            if let Some(open) = self.current.as_mut() {
                let leaf = open.expansion.next();
                for event in open.expansion.take_events() {
                    self.events.emit(event);
                }
                match leaf {
                    Some(leaf) => {
                        let decoded = decode_leaf(&open.origin, leaf, self.resolver, &mut self.events);
                        if decoded.is_some() {
                            return decoded;
                        }
                    }
                    None => self.current = None,
                }
                continue;
            }

            let item = self.dirs.last_mut()?.next();
            match item {
                None => {
                    self.dirs.pop();
                }
                Some(item) if item.is_dir => self.enter_dir(item.path),
                Some(item) => self.open_file(item),
            }
        }
    }
}

/// `"<файл> > <вложенный zip> > ... > <лист>"`; для обычного файла имя повторяется дважды.
pub fn reference(origin: &str, leaf: &NamedSource) -> String {
    let mut parts = vec![origin];
    parts.extend(leaf.parents.iter().skip(1).map(String::as_str));
    parts.push(&leaf.name);
    parts.join(" > ")
}

fn decode_leaf(
    origin: &str,
    leaf: NamedSource,
    resolver: &dyn SchemaResolver,
    events: &mut impl EventSink,
) -> Option<Bilan> {
    if !is_document(&leaf.name) {
        return None;
    }
    let reference = reference(origin, &leaf);
    match leaf.read_all() {
        Ok(bytes) => Some(bilan_xml::decode(bytes, reference, resolver)),
        Err(e) => {
            events.emit(Event::SourceUnreadable {
                reference,
                error: e.to_string(),
            });
            None
        }
    }
}
