//! Documents exchanged with the bank backend

use crate::error::{Error, Result};
use crate::upi::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend account number
pub type AccountNo = u32;

/// One row of `GET /accounts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Account number
    pub acc_no: AccountNo,
    /// Holder name
    pub name: String,
    /// Current balance as reported by the server
    pub balance: f64,
}

/// Full account document from `GET /accounts/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account number
    pub acc_no: AccountNo,
    /// Holder name
    pub name: String,
    /// Current balance
    pub balance: f64,
    /// Ledger entries, oldest first
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Issued cards
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// Ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Timestamp as formatted by the server (`yyyy-MM-dd HH:mm`)
    pub date: String,
    /// Entry kind such as `DEPOSIT` or `UPI_OUT`
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount moved
    pub amount: f64,
    /// Balance after the entry
    pub balance_after: f64,
    /// Free-text note
    #[serde(default)]
    pub note: Option<String>,
}

/// Card as listed by the server. Only the masked number is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Server-side card id
    pub id: String,
    /// Masked number, e.g. `**** **** **** 4242`
    pub masked: String,
    /// Expiry as `MM/YY`
    pub expiry: String,
    /// `DEBIT` or `CREDIT`
    #[serde(rename = "type")]
    pub kind: String,
    /// `ACTIVE` or `BLOCKED`
    pub status: String,
}

/// Card product to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardKind {
    /// Debit card
    #[default]
    Debit,
    /// Credit card
    Credit,
}

impl std::str::FromStr for CardKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(Error::Validation(format!(
                "Unknown card type '{other}', expected debit or credit"
            ))),
        }
    }
}

/// Login payload, tagged by role the way `POST /login` expects
#[derive(Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Credentials {
    /// Bank administrator
    Admin {
        /// Admin password
        password: String,
    },
    /// Account holder
    Customer {
        /// Account number
        #[serde(rename = "accNo")]
        acc_no: AccountNo,
        /// Account password
        password: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Admin { .. } => f.write_str("Credentials::Admin { password: <redacted> }"),
            Credentials::Customer { acc_no, .. } => write!(
                f,
                "Credentials::Customer {{ acc_no: {acc_no}, password: <redacted> }}"
            ),
        }
    }
}

/// Body of `POST /accounts`
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    /// Holder name
    pub name: String,
    /// Opening balance
    pub balance: Amount,
    /// Initial password; the server picks a default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Body of `POST /accounts/{id}/deposit`
#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    /// Amount to credit
    pub amount: Amount,
}

/// Body of `POST /accounts/{id}/transfer`
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    /// Destination account
    pub target: AccountNo,
    /// Amount to move
    pub amount: Amount,
    /// Free-text note
    pub note: String,
}

/// Body of `POST /accounts/{id}/upi`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiPaymentRequest {
    /// Receiver VPA
    pub upi_id: String,
    /// Amount to debit
    pub amount: Amount,
    /// Note; the server writes its own when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body of `POST /accounts/{id}/cards`
#[derive(Debug, Clone, Serialize)]
pub struct CardRequest {
    /// Card product
    #[serde(rename = "type")]
    pub kind: CardKind,
}

/// Status envelope used by every mutating endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// `ok` or `error`
    #[serde(default)]
    pub status: String,
    /// Human-readable failure reason
    pub message: Option<String>,
    /// Account returned by login/create
    pub account: Option<Account>,
    /// Card returned by card issue
    pub card: Option<Card>,
    /// Balance after a deposit or UPI payment
    pub balance: Option<f64>,
    /// Payer balance after a transfer
    pub from_balance: Option<f64>,
    /// Payee balance after a transfer
    pub to_balance: Option<f64>,
    /// Role echoed by admin login
    pub role: Option<String>,
}

impl Reply {
    /// True when the backend reported success
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Turn a non-ok reply into `Error::Backend` with the server message or `fallback`.
    pub fn into_result(self, fallback: &str) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::backend(self.message, fallback))
        }
    }
}
