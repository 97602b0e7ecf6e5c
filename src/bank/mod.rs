//! REST boundary to the bank backend
//!
//! Everything that owns money lives on the server. This module only packages
//! requests and interprets the `{status, message?}` envelopes that come back.

mod client;
mod models;

pub use client::{DEFAULT_BASE_URL, HttpBank};
pub use models::{
    Account, AccountNo, AccountSummary, Card, CardKind, CardRequest, Credentials, DepositRequest,
    NewAccount, Reply, Transaction, TransferRequest, UpiPaymentRequest,
};

use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;

/// Operations the client performs against the backend.
///
/// Business failures come back as [`crate::Error::Backend`] carrying the server
/// message; transport failures as [`crate::Error::Network`].
#[async_trait]
pub trait BankApi: Send + Sync {
    /// `POST /login`
    async fn login(&self, credentials: &Credentials) -> Result<Session>;

    /// `GET /accounts`
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>>;

    /// `GET /accounts/{id}`
    async fn account(&self, acc_no: AccountNo) -> Result<Account>;

    /// `POST /accounts`
    async fn create_account(&self, request: &NewAccount) -> Result<Account>;

    /// `DELETE /accounts/{id}`
    async fn delete_account(&self, acc_no: AccountNo) -> Result<()>;

    /// `POST /accounts/{id}/deposit`
    async fn deposit(&self, acc_no: AccountNo, request: &DepositRequest) -> Result<Reply>;

    /// `POST /accounts/{id}/transfer`
    async fn transfer(&self, acc_no: AccountNo, request: &TransferRequest) -> Result<Reply>;

    /// `POST /accounts/{id}/upi`
    async fn pay_upi(&self, acc_no: AccountNo, request: &UpiPaymentRequest) -> Result<Reply>;

    /// `GET /accounts/{id}/statement`, returned as CSV text
    async fn statement(&self, acc_no: AccountNo) -> Result<String>;

    /// `GET /accounts/{id}/cards`
    async fn cards(&self, acc_no: AccountNo) -> Result<Vec<Card>>;

    /// `POST /accounts/{id}/cards`
    async fn request_card(&self, acc_no: AccountNo, request: &CardRequest) -> Result<Card>;

    /// `GET /health`
    async fn health(&self) -> Result<()>;
}
