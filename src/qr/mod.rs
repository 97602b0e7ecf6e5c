//! QR code rendering, export and scanning
//!
//! [`QrSurface`] owns the one code visible at a time and exports it as PNG.
//! [`QrDecoder`] reads codes back from images so exports can be verified.

mod decoder;
mod encoder;
mod surface;

pub use decoder::QrDecoder;
pub use encoder::{DEFAULT_MIN_SIZE, MAX_MIN_SIZE, QrEncoder};
pub use surface::{QrSurface, RenderedQr};

use crate::error::{Error, Result};
use crate::upi::{Currency, PaymentIntent, uri};
use serde::{Deserialize, Serialize};

/// Contents of a scanned QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedQr {
    /// The raw decoded data
    pub data: Vec<u8>,
    /// String representation if valid UTF-8
    pub text: Option<String>,
}

impl ScannedQr {
    /// Wrap raw decoded bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let text = String::from_utf8(data.clone()).ok();
        Self { data, text }
    }

    /// Get the payload as a string, if valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Interpret the code as a UPI payment link
    pub fn payment_intent(&self, default_currency: &Currency) -> Result<PaymentIntent> {
        let text = self
            .as_str()
            .ok_or_else(|| Error::InvalidUri("QR code does not contain text".to_string()))?;
        uri::parse(text, default_currency)
    }
}
