use crate::model::Size;

pub mod canvas;
pub mod region;

/// Anything the packer can place: it only needs a size and a key to report.
///
/// Sizes must be finite and positive; the packer reports anything else as
/// unplaceable instead of placing it.
pub trait Item {
    fn size(&self) -> Size;
    fn key(&self) -> String;
}

impl Item for Size {
    fn size(&self) -> Size {
        *self
    }
    fn key(&self) -> String {
        self.geometry()
    }
}

impl<K: ToString> Item for (K, Size) {
    fn size(&self) -> Size {
        self.1
    }
    fn key(&self) -> String {
        self.0.to_string()
    }
}
