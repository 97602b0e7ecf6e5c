//! Render surface owning at most one QR code

use crate::error::{Error, Result};
use crate::qr::QrEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A code currently shown on a surface
#[derive(Debug, Clone)]
pub struct RenderedQr {
    text: String,
    image: DynamicImage,
}

impl RenderedQr {
    /// Text encoded in the code
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Rendered raster image
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Owns the single optional code visible in one place.
///
/// Rendering replaces, never accumulates: the previous code is dropped before
/// the new one is encoded.
#[derive(Debug, Clone, Default)]
pub struct QrSurface {
    encoder: QrEncoder,
    current: Option<RenderedQr>,
}

impl QrSurface {
    /// Create an empty surface drawing with `encoder`
    pub fn new(encoder: QrEncoder) -> Self {
        Self {
            encoder,
            current: None,
        }
    }

    /// Encode `text` and make it the visible code.
    ///
    /// On encode failure the surface is left empty.
    pub fn render(&mut self, text: &str) -> Result<&RenderedQr> {
        self.current = None;
        let image = self.encoder.encode(text)?;
        tracing::debug!(length = text.len(), "rendered QR code");
        Ok(&*self.current.insert(RenderedQr {
            text: text.to_string(),
            image,
        }))
    }

    /// Remove the visible code, returning it if there was one
    pub fn clear(&mut self) -> Option<RenderedQr> {
        self.current.take()
    }

    /// The visible code, if any
    pub fn current(&self) -> Option<&RenderedQr> {
        self.current.as_ref()
    }

    /// True when nothing is rendered
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Terminal art for the visible code
    pub fn to_terminal(&self) -> Result<String> {
        let rendered = self.current.as_ref().ok_or(Error::NothingToExport)?;
        self.encoder.encode_terminal(&rendered.text)
    }

    /// PNG bytes of the visible code
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let rendered = self.current.as_ref().ok_or(Error::NothingToExport)?;
        let mut cursor = Cursor::new(Vec::new());
        rendered.image.write_to(&mut cursor, ImageFormat::Png)?;
        Ok(cursor.into_inner())
    }

    /// Write the visible code to `path` as PNG
    pub fn export_png(&self, path: &Path) -> Result<PathBuf> {
        let bytes = self.png_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        tracing::info!(path = %path.display(), "exported QR code");
        Ok(path.to_path_buf())
    }
}
