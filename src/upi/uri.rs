//! `upi://pay` deep-link construction and parsing

use crate::error::{Error, Result};
use crate::upi::{Amount, Currency, PaymentIntent};
use url::form_urlencoded;

/// Scheme and path every payment link starts with
pub const UPI_PAY_PREFIX: &str = "upi://pay?";

/// Serialize an intent into a deep link.
///
/// Parameters are emitted in a fixed order (`pa`, `pn`, `am`, `tn`, `cu`);
/// absent optional fields produce no parameter at all.
pub fn build(intent: &PaymentIntent) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("pa", intent.payee_id().as_str());
    if let Some(name) = intent.payee_name() {
        query.append_pair("pn", name);
    }
    if let Some(amount) = intent.amount() {
        query.append_pair("am", &amount.to_string());
    }
    if let Some(note) = intent.note() {
        query.append_pair("tn", note);
    }
    query.append_pair("cu", intent.currency().as_str());

    format!("{UPI_PAY_PREFIX}{}", query.finish())
}

/// Parse a deep link back into an intent.
///
/// A missing `cu` falls back to `default_currency`; unknown parameters are ignored.
pub fn parse(text: &str, default_currency: &Currency) -> Result<PaymentIntent> {
    let query = text
        .trim()
        .strip_prefix(UPI_PAY_PREFIX)
        .ok_or_else(|| Error::InvalidUri(format!("expected '{UPI_PAY_PREFIX}' prefix")))?;

    let mut payee = None;
    let mut name = None;
    let mut amount = None;
    let mut note = None;
    let mut currency = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "pa" => payee = Some(value.into_owned()),
            "pn" => name = Some(value.into_owned()),
            "am" => amount = Some(value.into_owned()),
            "tn" => note = Some(value.into_owned()),
            "cu" => currency = Some(value.into_owned()),
            other => tracing::debug!(parameter = other, "ignoring unknown UPI parameter"),
        }
    }

    let payee = payee.unwrap_or_default();
    let mut intent = PaymentIntent::new(&payee)
        .map_err(|_| Error::InvalidUri("missing payee address (pa)".to_string()))?;

    if let Some(name) = name {
        intent = intent.with_payee_name(&name);
    }
    if let Some(amount) = amount.filter(|a| !a.trim().is_empty()) {
        let parsed = Amount::parse(&amount)
            .map_err(|_| Error::InvalidUri(format!("invalid amount '{amount}'")))?;
        intent = intent.with_amount(parsed);
    }
    if let Some(note) = note {
        intent = intent.with_note(&note);
    }
    let currency = match currency {
        Some(code) => {
            Currency::new(&code).map_err(|_| Error::InvalidUri(format!("invalid currency '{code}'")))?
        }
        None => default_currency.clone(),
    };

    Ok(intent.with_currency(currency))
}
