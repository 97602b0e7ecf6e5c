//! Error types for upilink operations

use thiserror::Error;

/// Result type alias using upilink's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Text shown when a request never reached the backend or its reply was unreadable
pub const NETWORK_MESSAGE: &str = "Network or server error";

/// Main error type for upilink operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is empty or malformed; the request is never sent
    #[error("{0}")]
    Validation(String),

    /// The request could not be delivered or the connection failed
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with something other than the expected document
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The backend reported a business failure (`status != "ok"`)
    #[error("{0}")]
    Backend(String),

    /// A payment submission is already pending
    #[error("A payment is already in progress")]
    Busy,

    /// The operation needs a logged-in customer
    #[error("You must be logged in as a customer to pay.")]
    NotCustomer,

    /// The operation needs an admin login
    #[error("Admin login required")]
    NotAdmin,

    /// Export was requested while the surface holds no code
    #[error("Generate a QR first")]
    NothingToExport,

    /// Text is not a `upi://pay` deep link
    #[error("Invalid UPI URI: {0}")]
    InvalidUri(String),

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a backend failure from the optional server message, falling back to `fallback`.
    pub fn backend(message: Option<String>, fallback: &str) -> Self {
        match message {
            Some(text) if !text.trim().is_empty() => Error::Backend(text),
            _ => Error::Backend(fallback.to_string()),
        }
    }

    /// The text a user sees for this error.
    ///
    /// Transport failures collapse into one generic connectivity message; backend
    /// messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) | Error::UnexpectedResponse(_) => NETWORK_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// True for client-side validation failures that block a call entirely.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::UnexpectedResponse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::UnexpectedResponse(format!("JSON error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_falls_back_when_blank() {
        let err = Error::backend(Some("  ".to_string()), "Payment failed");
        assert_eq!(err.user_message(), "Payment failed");

        let err = Error::backend(Some("insufficient".to_string()), "Payment failed");
        assert_eq!(err.user_message(), "insufficient");
    }

    #[test]
    fn transport_failures_share_one_message() {
        let err = Error::Network("connection refused".to_string());
        assert_eq!(err.user_message(), NETWORK_MESSAGE);
        assert!(!err.is_validation());
    }
}
