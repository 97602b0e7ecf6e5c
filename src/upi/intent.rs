//! Payment intents and the raw form they are built from

use crate::error::{Error, Result};
use crate::upi::Amount;
use crate::upi::uri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency every intent carries unless configured otherwise
pub const DEFAULT_CURRENCY: &str = "INR";

/// A validated three-letter currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate and upper-case a currency code.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(Error::Validation(format!(
                "Currency must be a 3-letter code, got '{code}'"
            )))
        }
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Destination identifier (VPA such as `merchant@bank`). Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PayeeId(String);

impl PayeeId {
    /// Trim and validate a payee id; blank input is rejected with `message`.
    pub fn parse(input: &str, message: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation(message.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transient description of a payment before submission.
///
/// The payee id is validated on construction, so every intent can be
/// serialized into a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    payee_id: PayeeId,
    payee_name: Option<String>,
    amount: Option<Amount>,
    note: Option<String>,
    currency: Currency,
}

impl PaymentIntent {
    /// Start an intent for `payee_id` in the default currency.
    pub fn new(payee_id: &str) -> Result<Self> {
        Ok(Self::for_payee(PayeeId::parse(
            payee_id,
            "Payee UPI ID is required",
        )?))
    }

    /// Start an intent for an already validated payee.
    pub fn for_payee(payee_id: PayeeId) -> Self {
        Self {
            payee_id,
            payee_name: None,
            amount: None,
            note: None,
            currency: Currency::default(),
        }
    }

    /// Set the payee display name; blank names are dropped.
    pub fn with_payee_name(mut self, name: &str) -> Self {
        self.payee_name = non_blank(name);
        self
    }

    /// Set the amount.
    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the free-text note; blank notes are dropped.
    pub fn with_note(mut self, note: &str) -> Self {
        self.note = non_blank(note);
        self
    }

    /// Set the currency.
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Destination identifier
    pub fn payee_id(&self) -> &PayeeId {
        &self.payee_id
    }

    /// Optional payee display name
    pub fn payee_name(&self) -> Option<&str> {
        self.payee_name.as_deref()
    }

    /// Optional amount
    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    /// Optional note
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Currency code
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Serialize into a `upi://pay?` deep link.
    pub fn to_uri(&self) -> String {
        uri::build(self)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Which payments workflow a form belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrMode {
    /// Merchant code: payee identity, amount optional
    #[default]
    Static,
    /// Live code regenerated while the payer edits the form
    Dynamic,
}

impl QrMode {
    /// File name used when exporting a code generated in this mode
    pub fn export_file_name(self) -> &'static str {
        match self {
            QrMode::Static => "upi_static.png",
            QrMode::Dynamic => "upi_dynamic.png",
        }
    }

    /// Message shown when the payee field is blank in this mode
    pub fn missing_payee_message(self) -> &'static str {
        match self {
            QrMode::Static => "Enter merchant UPI ID",
            QrMode::Dynamic => "Enter receiver UPI ID",
        }
    }

    /// Lowercase label
    pub fn label(self) -> &'static str {
        match self {
            QrMode::Static => "static",
            QrMode::Dynamic => "dynamic",
        }
    }
}

/// Raw text of the payment form fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    /// Payee UPI id field
    pub payee_id: String,
    /// Payee name field
    pub payee_name: String,
    /// Amount field
    pub amount: String,
    /// Note field
    pub note: String,
}

impl PaymentForm {
    /// Build the intent for a QR code in `mode`. Amount is optional here.
    pub fn qr_intent(&self, mode: QrMode, currency: &Currency) -> Result<PaymentIntent> {
        let payee = PayeeId::parse(&self.payee_id, mode.missing_payee_message())?;
        let mut intent = PaymentIntent::for_payee(payee)
            .with_payee_name(&self.payee_name)
            .with_note(&self.note)
            .with_currency(currency.clone());

        if !self.amount.trim().is_empty() {
            intent = intent.with_amount(Amount::parse(&self.amount)?);
        }

        Ok(intent)
    }

    /// Build the intent for an immediate payment: payee and a positive amount are required.
    pub fn pay_intent(&self, currency: &Currency) -> Result<PaymentIntent> {
        const MESSAGE: &str = "Enter valid details";

        let payee = PayeeId::parse(&self.payee_id, MESSAGE)?;
        let amount = Amount::parse(&self.amount)
            .ok()
            .filter(|amount| amount.is_positive())
            .ok_or_else(|| Error::Validation(MESSAGE.to_string()))?;

        Ok(PaymentIntent::for_payee(payee)
            .with_payee_name(&self.payee_name)
            .with_amount(amount)
            .with_note(&self.note)
            .with_currency(currency.clone()))
    }
}
