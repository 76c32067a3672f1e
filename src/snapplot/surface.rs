//! The rendering surface a capture saves its image from.
//!
//! snapplot does not plot. Whatever library draws the figure is wrapped in a
//! [`RenderSurface`], which only has to answer whether it currently holds content
//! and write that content to a file.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;

/// How much of the figure to keep when saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Trim surrounding whitespace.
    #[default]
    Tight,
    /// Keep the full canvas.
    Full,
}

pub trait RenderSurface {
    /// Whether there is a drawn figure to save.
    fn has_content(&self) -> bool;

    /// File extension of saved images, without the dot.
    fn extension(&self) -> &str {
        "png"
    }

    /// Writes the current figure to `path`.
    fn save(&self, path: &Path, dpi: u32, crop: CropMode) -> io::Result<()>;
}

impl<T: RenderSurface + ?Sized> RenderSurface for &T {
    fn has_content(&self) -> bool {
        (**self).has_content()
    }

    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn save(&self, path: &Path, dpi: u32, crop: CropMode) -> io::Result<()> {
        (**self).save(path, dpi, crop)
    }
}

/// A surface that never has content. Captures against it write no image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurface;

impl RenderSurface for NoSurface {
    fn has_content(&self) -> bool {
        false
    }

    fn save(&self, _path: &Path, _dpi: u32, _crop: CropMode) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no figure to save"))
    }
}

/// Holds an already-encoded image, for plotting code that renders to bytes.
///
/// Resolution and crop mode are properties of the encoded image and are ignored
/// on save.
#[derive(Debug, Default)]
pub struct ImageSlot {
    image: RefCell<Option<Vec<u8>>>,
    extension: String,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::with_extension("png")
    }

    pub fn with_extension(extension: &str) -> Self {
        Self {
            image: RefCell::new(None),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Replaces the current figure.
    pub fn present(&self, bytes: impl Into<Vec<u8>>) {
        *self.image.borrow_mut() = Some(bytes.into());
    }

    pub fn clear(&self) {
        *self.image.borrow_mut() = None;
    }
}

impl RenderSurface for ImageSlot {
    fn has_content(&self) -> bool {
        self.image
            .borrow()
            .as_ref()
            .map(|bytes| !bytes.is_empty())
            .unwrap_or(false)
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn save(&self, path: &Path, _dpi: u32, _crop: CropMode) -> io::Result<()> {
        match self.image.borrow().as_ref() {
            Some(bytes) => fs::write(path, bytes),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no figure to save")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_slot_lifecycle() {
        let slot = ImageSlot::new();
        assert!(!slot.has_content());

        slot.present(b"\x89PNG".to_vec());
        assert!(slot.has_content());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plot.png");
        slot.save(&path, 300, CropMode::Tight).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"\x89PNG");

        slot.clear();
        assert!(!slot.has_content());
        assert!(slot.save(&path, 300, CropMode::Full).is_err());
    }

    #[test]
    fn test_extension_is_normalized() {
        assert_eq!(ImageSlot::with_extension(".svg").extension(), "svg");
        assert_eq!(NoSurface.extension(), "png");
    }

    #[test]
    fn test_no_surface_has_no_content() {
        assert!(!NoSurface.has_content());
        let by_ref: &dyn RenderSurface = &NoSurface;
        assert!(!(&by_ref).has_content());
    }
}
