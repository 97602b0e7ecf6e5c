//! `reqwest` implementation of [`BankApi`]

use super::models::{
    Account, AccountNo, AccountSummary, Card, CardRequest, Credentials, DepositRequest, NewAccount,
    Reply, TransferRequest, UpiPaymentRequest,
};
use super::BankApi;
use crate::error::{Error, Result};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Backend address used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:4567/api";

/// HTTP client for the bank backend. No timeouts are applied: the server's
/// answer or a connection failure is the only resolution of a request.
#[derive(Debug, Clone)]
pub struct HttpBank {
    http: HttpClient,
    base_url: String,
}

impl HttpBank {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:4567/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must be http(s), got '{}'",
                parsed.scheme()
            )));
        }

        Ok(Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Root URL every endpoint path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Read a JSON body. A non-2xx reply carrying the `{status, message}`
    /// envelope is a business failure and falls back to `fallback`.
    async fn read_value(response: reqwest::Response, fallback: &str) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                if !status.is_success() {
                    reject_error_envelope(&value, fallback)?;
                    return Err(match value.get("message").and_then(Value::as_str) {
                        Some(text) => Error::Backend(text.to_string()),
                        None => Error::UnexpectedResponse(format!("HTTP {status}")),
                    });
                }
                Ok(value)
            }
            Err(e) if status.is_success() => Err(Error::UnexpectedResponse(format!(
                "invalid JSON body: {e}"
            ))),
            Err(_) => Err(Error::UnexpectedResponse(format!("HTTP {status}"))),
        }
    }

    async fn get_value(&self, path: &str, fallback: &str) -> Result<Value> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        Self::read_value(response, fallback).await
    }

    /// GET a document that is either `T` or an error envelope
    async fn get_document<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get_value(path, "Request failed").await?;
        reject_error_envelope(&value, "Request failed")?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post_reply<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<Reply> {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        let value = Self::read_value(response, fallback).await?;
        let reply: Reply = serde_json::from_value(value)?;
        reply.into_result(fallback)
    }
}

fn reject_error_envelope(value: &Value, fallback: &str) -> Result<()> {
    let is_error = value
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| !status.eq_ignore_ascii_case("ok"));

    if is_error {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(Error::backend(message, fallback));
    }
    Ok(())
}

#[async_trait]
impl BankApi for HttpBank {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let reply = self.post_reply("/login", credentials, "Login failed").await?;

        match credentials {
            Credentials::Admin { .. } => Ok(Session::Admin),
            Credentials::Customer { acc_no, .. } => {
                let account = reply.account;
                Ok(Session::Customer {
                    acc_no: account.as_ref().map_or(*acc_no, |a| a.acc_no),
                    name: account.map(|a| a.name),
                })
            }
        }
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        self.get_document("/accounts").await
    }

    async fn account(&self, acc_no: AccountNo) -> Result<Account> {
        self.get_document(&format!("/accounts/{acc_no}")).await
    }

    async fn create_account(&self, request: &NewAccount) -> Result<Account> {
        let reply = self
            .post_reply("/accounts", request, "Could not create account")
            .await?;
        reply
            .account
            .ok_or_else(|| Error::UnexpectedResponse("reply carried no account".to_string()))
    }

    async fn delete_account(&self, acc_no: AccountNo) -> Result<()> {
        let url = self.endpoint(&format!("/accounts/{acc_no}"));
        debug!(%url, "DELETE");
        let response = self.http.delete(&url).send().await?;
        let value = Self::read_value(response, "Delete failed").await?;
        let reply: Reply = serde_json::from_value(value)?;
        reply.into_result("Delete failed").map(|_| ())
    }

    async fn deposit(&self, acc_no: AccountNo, request: &DepositRequest) -> Result<Reply> {
        self.post_reply(&format!("/accounts/{acc_no}/deposit"), request, "Deposit failed")
            .await
    }

    async fn transfer(&self, acc_no: AccountNo, request: &TransferRequest) -> Result<Reply> {
        self.post_reply(
            &format!("/accounts/{acc_no}/transfer"),
            request,
            "Transfer failed",
        )
        .await
    }

    async fn pay_upi(&self, acc_no: AccountNo, request: &UpiPaymentRequest) -> Result<Reply> {
        self.post_reply(&format!("/accounts/{acc_no}/upi"), request, "Payment failed")
            .await
    }

    async fn statement(&self, acc_no: AccountNo) -> Result<String> {
        let url = self.endpoint(&format!("/accounts/{acc_no}/statement"));
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        let is_csv = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/csv"));
        let body = response.text().await?;

        if status.is_success() && is_csv {
            return Ok(body);
        }

        warn!(%status, "statement request did not return CSV");
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            reject_error_envelope(&value, "Statement unavailable")?;
        }
        let text = body.trim();
        Err(Error::Backend(if text.is_empty() {
            "Statement unavailable".to_string()
        } else {
            text.to_string()
        }))
    }

    async fn cards(&self, acc_no: AccountNo) -> Result<Vec<Card>> {
        self.get_document(&format!("/accounts/{acc_no}/cards"))
            .await
    }

    async fn request_card(&self, acc_no: AccountNo, request: &CardRequest) -> Result<Card> {
        let reply = self
            .post_reply(
                &format!("/accounts/{acc_no}/cards"),
                request,
                "Card request failed",
            )
            .await?;
        reply
            .card
            .ok_or_else(|| Error::UnexpectedResponse("reply carried no card".to_string()))
    }

    async fn health(&self) -> Result<()> {
        let value = self.get_value("/health", "Backend unhealthy").await?;
        reject_error_envelope(&value, "Backend unhealthy")
    }
}
