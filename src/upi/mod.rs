//! UPI payment intents and deep links
//!
//! A [`PaymentIntent`] is the transient description of a payment built from
//! form input. It serializes into a `upi://pay?` link that payment apps open
//! directly or scan from a QR code.

mod amount;
mod intent;
pub mod uri;

pub use amount::Amount;
pub use intent::{Currency, DEFAULT_CURRENCY, PayeeId, PaymentForm, PaymentIntent, QrMode};
pub use uri::UPI_PAY_PREFIX;
