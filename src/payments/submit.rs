//! Pay Now submission with a single-flight guard

use crate::bank::{AccountNo, BankApi, UpiPaymentRequest};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::upi::PaymentIntent;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Confirmation of a payment the backend accepted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayReceipt {
    /// Account that was debited
    pub account: AccountNo,
    /// Receiver VPA
    pub upi_id: String,
    /// Amount formatted with two decimals
    pub amount: String,
    /// Deep link of the confirmed payment
    pub uri: String,
    /// Balance after the debit, when the server reported one
    pub balance: Option<f64>,
    /// Message to show the user
    pub message: String,
}

/// Sends UPI payments for the logged-in customer.
///
/// At most one submission is in flight at a time; a second call while one is
/// pending fails with [`Error::Busy`] without reaching the backend.
pub struct PaySubmitter<B: ?Sized> {
    bank: Arc<B>,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: BankApi + ?Sized> PaySubmitter<B> {
    /// Create a submitter talking to `bank`
    pub fn new(bank: Arc<B>) -> Self {
        Self {
            bank,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a submission is pending
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| Error::Busy)
    }

    /// Debit the session's account for `intent`.
    pub async fn submit(&self, session: &Session, intent: &PaymentIntent) -> Result<PayReceipt> {
        let account = session.customer_account()?;
        let amount = intent
            .amount()
            .filter(|amount| amount.is_positive())
            .ok_or_else(|| Error::Validation("Enter valid details".to_string()))?;

        let _guard = self.begin()?;

        let request = UpiPaymentRequest {
            upi_id: intent.payee_id().to_string(),
            amount,
            note: intent.note().map(str::to_string),
        };

        info!(account, upi_id = %request.upi_id, %amount, "submitting UPI payment");
        let reply = self.bank.pay_upi(account, &request).await?;

        let balance = match self.bank.account(account).await {
            Ok(refreshed) => Some(refreshed.balance),
            Err(err) => {
                warn!(account, error = %err, "payment accepted but balance refresh failed");
                reply.balance
            }
        };

        Ok(PayReceipt {
            account,
            upi_id: request.upi_id,
            amount: amount.to_string(),
            uri: intent.to_uri(),
            balance,
            message: "Payment successful".to_string(),
        })
    }
}
