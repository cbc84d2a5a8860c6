//! Точки расширения конвейера: схема кодов liasse и приёмник событий.

use crate::{events::Event, model::LineKey};
use std::collections::HashMap;

/// Имена полей для четырёх значений M1..M4 строки; пустая строка — слот не используется.
pub type Slots = [String; 4];

/// Справочник кодов liasse. `None` — код неизвестен.
pub trait SchemaResolver {
    fn resolve(&self, key: &LineKey) -> Option<&Slots>;
}

impl SchemaResolver for HashMap<LineKey, Slots> {
    fn resolve(&self, key: &LineKey) -> Option<&Slots> {
        self.get(key)
    }
}

/// Получатель «мягких» сбоев обхода (нечитаемые каталоги, битые архивы...).
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

impl EventSink for std::sync::mpsc::Sender<Event> {
    fn emit(&mut self, event: Event) {
        // закрытый приёмник не должен ронять обход
        let _ = self.send(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) {
        (**self).emit(event);
    }
}
