//! View-models rendered into structured and human-readable output
//!
//! Every function here is a pure mapping from state to a [`Rendered`] pair, so
//! what is printed depends only on the values passed in. The current user is
//! always passed explicitly as a [`Session`].

use crate::bank::{Account, AccountSummary, Card, Transaction};
use crate::error::Error;
use crate::payments::{PayReceipt, PaymentsView};
use crate::qr::ScannedQr;
use crate::session::Session;
use crate::upi::PaymentIntent;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Combined structured and human-readable representation of a view
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Colour of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Action succeeded
    Success,
    /// Action failed
    Error,
    /// Neutral notice
    Info,
}

/// One-line message shown beneath a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    /// Message text
    pub text: String,
    /// How to present it
    pub tone: Tone,
}

impl StatusLine {
    /// Success message
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    /// Error message
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }

    /// Neutral message
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Info,
        }
    }

    fn marker(&self) -> &'static str {
        match self.tone {
            Tone::Success => "✓",
            Tone::Error => "✗",
            Tone::Info => "•",
        }
    }
}

/// Format a server balance as rupees with two decimals.
pub fn money(value: f64) -> String {
    format!("₹{value:.2}")
}

/// Header for the logged-in user.
pub fn render_session(session: &Session) -> Rendered {
    Rendered {
        json: json!({ "session": session, "summary": session.summary() }),
        human: vec![format!("Logged in: {}", session.summary())],
    }
}

/// Admin accounts table.
pub fn render_accounts(session: &Session, accounts: &[AccountSummary]) -> Rendered {
    let mut human = vec![session.summary(), format!("Accounts ({})", accounts.len())];
    if accounts.is_empty() {
        human.push("  No accounts".to_string());
    }
    for account in accounts {
        human.push(format!(
            "  {:>6}  {:<24} {:>14}",
            account.acc_no,
            account.name,
            money(account.balance)
        ));
    }

    Rendered {
        json: json!({ "user": session.summary(), "accounts": accounts }),
        human,
    }
}

/// Account detail with its ledger, newest entry first.
pub fn render_account(session: &Session, account: &Account) -> Rendered {
    let mut human = vec![
        session.summary(),
        format!("Account {} - {}", account.acc_no, account.name),
        format!("  Balance: {}", money(account.balance)),
        format!("  Transactions: {}", account.transactions.len()),
    ];
    human.extend(account.transactions.iter().rev().map(transaction_line));
    if !account.cards.is_empty() {
        human.push(format!("  Cards: {}", account.cards.len()));
        human.extend(account.cards.iter().map(card_line));
    }

    Rendered {
        json: json!({ "user": session.summary(), "account": account }),
        human,
    }
}

fn transaction_line(tx: &Transaction) -> String {
    let note = tx.note.as_deref().unwrap_or("");
    format!(
        "    {}  {:<12} {:>12}  -> {:>12}  {}",
        tx.date,
        tx.kind,
        money(tx.amount),
        money(tx.balance_after),
        note
    )
    .trim_end()
    .to_string()
}

fn card_line(card: &Card) -> String {
    format!(
        "    {}  {:<6} exp {}  {}",
        card.masked, card.kind, card.expiry, card.status
    )
}

/// Cards of the session's account.
pub fn render_cards(session: &Session, cards: &[Card]) -> Rendered {
    let mut human = vec![session.summary(), format!("Cards ({})", cards.len())];
    if cards.is_empty() {
        human.push("  No cards issued".to_string());
    }
    human.extend(cards.iter().map(card_line));

    Rendered {
        json: json!({ "user": session.summary(), "cards": cards }),
        human,
    }
}

/// Result of a mutating call the server acknowledged.
pub fn render_ack(session: &Session, message: &str, balance: Option<f64>) -> Rendered {
    let mut human = vec![session.summary(), format!("✓ {message}")];
    if let Some(balance) = balance {
        human.push(format!("  New balance: {}", money(balance)));
    }

    Rendered {
        json: json!({ "user": session.summary(), "status": "ok", "message": message, "balance": balance }),
        human,
    }
}

/// Confirmation of an accepted UPI payment.
pub fn render_receipt(session: &Session, receipt: &PayReceipt) -> Rendered {
    let mut human = vec![
        session.summary(),
        format!("✓ {}", receipt.message),
        format!("  To: {}", receipt.upi_id),
        format!("  Amount: ₹{}", receipt.amount),
    ];
    if let Some(balance) = receipt.balance {
        human.push(format!("  New balance: {}", money(balance)));
    }
    human.push(format!("  Link: {}", receipt.uri));

    Rendered {
        json: json!({ "user": session.summary(), "receipt": receipt }),
        human,
    }
}

/// Attach the outcome of saving a payment's QR to an already rendered receipt.
///
/// The receipt stays intact either way: an export failure is only a note.
pub fn note_export(rendered: &mut Rendered, outcome: std::result::Result<&Path, &Error>) {
    let (value, line) = match outcome {
        Ok(path) => (
            json!({ "path": path.display().to_string() }),
            format!("  QR saved to {}", path.display()),
        ),
        Err(err) => (
            json!({ "error": err.user_message() }),
            format!("  ✗ QR not saved: {}", err.user_message()),
        ),
    };
    if let Value::Object(map) = &mut rendered.json {
        map.insert("export".to_string(), value);
    }
    rendered.human.push(line);
}

/// Where a downloaded statement was saved.
pub fn render_statement_saved(session: &Session, path: &Path, csv: &str) -> Rendered {
    let rows = csv.lines().skip(1).filter(|line| !line.trim().is_empty()).count();
    Rendered {
        json: json!({ "user": session.summary(), "path": path.display().to_string(), "rows": rows }),
        human: vec![
            session.summary(),
            format!("✓ Statement saved to {} ({rows} entries)", path.display()),
        ],
    }
}

/// Structured description of an intent.
pub fn intent_value(intent: &PaymentIntent) -> Value {
    let mut root = Map::new();
    root.insert(
        "payee_id".to_string(),
        Value::String(intent.payee_id().to_string()),
    );
    root.insert(
        "payee_name".to_string(),
        intent.payee_name().map_or(Value::Null, Value::from),
    );
    root.insert(
        "amount".to_string(),
        intent
            .amount()
            .map_or(Value::Null, |a| Value::String(a.to_string())),
    );
    root.insert("note".to_string(), intent.note().map_or(Value::Null, Value::from));
    root.insert(
        "currency".to_string(),
        Value::String(intent.currency().to_string()),
    );
    root.insert("uri".to_string(), Value::String(intent.to_uri()));
    Value::Object(root)
}

fn intent_lines(intent: &PaymentIntent) -> Vec<String> {
    let mut lines = vec![format!("  Payee: {}", intent.payee_id())];
    if let Some(name) = intent.payee_name() {
        lines.push(format!("  Name: {name}"));
    }
    if let Some(amount) = intent.amount() {
        lines.push(format!("  Amount: {amount} {}", intent.currency()));
    }
    if let Some(note) = intent.note() {
        lines.push(format!("  Note: {note}"));
    }
    lines
}

/// Payments screen: mode, status line and the visible code.
///
/// `terminal_art` adds the code drawn with Unicode blocks to the human lines.
pub fn render_payments(view: &PaymentsView, terminal_art: bool) -> Rendered {
    let current = view.surface().current();
    let mut human = vec![format!("UPI QR ({} mode)", view.mode().label())];

    if let Some(status) = view.status() {
        human.push(format!("{} {}", status.marker(), status.text));
    }

    match current {
        Some(rendered) => {
            human.push(format!("  {}", rendered.text()));
            if terminal_art {
                if let Ok(art) = view.surface().to_terminal() {
                    human.extend(art.lines().map(str::to_string));
                }
            }
        }
        None => human.push("  (no QR)".to_string()),
    }

    Rendered {
        json: json!({
            "mode": view.mode(),
            "status": view.status(),
            "qr": current.map(|rendered| rendered.text()),
        }),
        human,
    }
}

/// Contents of a scanned code and, when it is one, the payment it describes.
pub fn render_scanned(scanned: &ScannedQr, intent: Result<&PaymentIntent, &Error>) -> Rendered {
    let mut human = Vec::new();
    match scanned.as_str() {
        Some(text) => human.push(format!("QR text: {text}")),
        None => human.push(format!("QR binary payload ({} bytes)", scanned.data.len())),
    }

    let upi = match intent {
        Ok(intent) => {
            human.push("UPI payment link".to_string());
            human.extend(intent_lines(intent));
            intent_value(intent)
        }
        Err(err) => {
            human.push(format!("Not a UPI payment link: {}", err.user_message()));
            Value::Null
        }
    };

    Rendered {
        json: json!({ "text": scanned.as_str(), "byte_length": scanned.data.len(), "upi": upi }),
        human,
    }
}

/// An error as shown to the user.
pub fn render_error(err: &Error) -> Rendered {
    let message = err.user_message();
    Rendered {
        json: json!({ "error": message }),
        human: vec![format!("✗ {message}")],
    }
}
