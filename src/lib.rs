//! upilink - terminal client for a demo bank with UPI QR payments
//!
//! The backend owns every account, balance and ledger entry. This library is
//! the client side: it builds UPI deep links, renders and exports them as QR
//! codes, talks to the bank's REST API and turns its replies into views.
//!
//! # Features
//!
//! - **UPI links**: validated [`PaymentIntent`]s serialized to `upi://pay?` URIs
//! - **QR surface**: one visible code at a time, PNG export, terminal preview
//! - **REST boundary**: async [`BankApi`] trait with a `reqwest` implementation
//! - **Explicit sessions**: the logged-in user is a value, never ambient state
//!
//! # Example
//!
//! ```no_run
//! use upilink::{Amount, PaymentIntent, QrSurface};
//!
//! fn main() -> upilink::Result<()> {
//!     let intent = PaymentIntent::new("merchant@bank")?
//!         .with_amount(Amount::parse("10")?)
//!         .with_note("lunch");
//!
//!     let mut surface = QrSurface::default();
//!     surface.render(&intent.to_uri())?;
//!     surface.export_png(std::path::Path::new("upi_static.png"))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod bank;
pub mod config;
pub mod error;
pub mod logging;
pub mod payments;
pub mod qr;
pub mod session;
pub mod upi;
pub mod view;

// Re-exports for convenience
pub use error::{Error, Result};

pub use bank::{BankApi, HttpBank};
pub use config::{ApiOptions, LogRotation, LoggingOptions, PaymentOptions, QrOptions, UpiLinkConfig};
pub use payments::{PayReceipt, PaySubmitter, PaymentsView};
pub use qr::{QrDecoder, QrEncoder, QrSurface, ScannedQr};
pub use session::Session;
pub use upi::{Amount, Currency, PaymentForm, PaymentIntent, QrMode};
