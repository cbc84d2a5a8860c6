//! rncslib — извлечение биланов RNCS из дерева каталогов с вложенными zip
//!
//! Входная точка — [`walker::walk`]: ленивый поток [`model::Bilan`],
//! который никогда не обрывается из-за одного плохого файла.

pub mod archive;
pub mod error;
pub mod events;
pub mod model;
pub mod schema;
pub mod traits;
pub mod walker;

pub mod formats {
    pub mod bilan_xml;
}

pub use walker::walk;
