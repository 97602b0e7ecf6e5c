//! QR code encoder

use crate::error::{Error, Result};
use image::{DynamicImage, Luma};
use qrcode::render::unicode;
use qrcode::{EcLevel, QrCode};

/// Smallest edge, in pixels, of an encoded image unless configured otherwise
pub const DEFAULT_MIN_SIZE: u32 = 220;

/// Upper bound for a configured minimum edge
pub const MAX_MIN_SIZE: u32 = 4096;

/// QR code encoder
#[derive(Debug, Clone)]
pub struct QrEncoder {
    /// Error correction level
    ecc_level: EcLevel,
    /// Minimum edge length of rendered images
    min_size: u32,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings (High ECC, 220px)
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::H,
            min_size: DEFAULT_MIN_SIZE,
        }
    }

    /// Create a new QR encoder with a specific error correction level
    pub fn with_ecc_level(ecc_level: EcLevel) -> Self {
        Self {
            ecc_level,
            ..Self::new()
        }
    }

    /// Override the minimum image edge length, clamped to `21..=MAX_MIN_SIZE`
    pub fn min_size(mut self, pixels: u32) -> Self {
        self.min_size = pixels.clamp(21, MAX_MIN_SIZE);
        self
    }

    /// Parse an error correction level name (`L`, `M`, `Q`, `H`).
    pub fn parse_ecc_level(value: &str) -> Result<EcLevel> {
        match value.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(EcLevel::L),
            "M" => Ok(EcLevel::M),
            "Q" => Ok(EcLevel::Q),
            "H" => Ok(EcLevel::H),
            other => Err(Error::Config(format!(
                "Unknown error correction level '{other}'. Use L, M, Q or H"
            ))),
        }
    }

    fn code(&self, text: &str) -> Result<QrCode> {
        QrCode::with_error_correction_level(text.as_bytes(), self.ecc_level)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))
    }

    /// Encode text into a QR code image
    pub fn encode(&self, text: &str) -> Result<DynamicImage> {
        let image = self
            .code(text)?
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .build();

        Ok(DynamicImage::ImageLuma8(image))
    }

    /// Encode text into Unicode half-block art for terminal display
    pub fn encode_terminal(&self, text: &str) -> Result<String> {
        Ok(self
            .code(text)?
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build())
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}
