//! Logged-in user context
//!
//! A [`Session`] is produced by a successful login and handed explicitly to
//! every operation and view that depends on who is using the client.

use crate::bank::AccountNo;
use crate::error::{Error, Result};
use serde::Serialize;

/// Who is logged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Session {
    /// Bank administrator
    Admin,
    /// Account holder
    Customer {
        /// Account number the session acts for
        acc_no: AccountNo,
        /// Holder name, when the login reply carried it
        name: Option<String>,
    },
}

impl Session {
    /// Account number for customer-only operations such as paying.
    pub fn customer_account(&self) -> Result<AccountNo> {
        match self {
            Session::Customer { acc_no, .. } => Ok(*acc_no),
            Session::Admin => Err(Error::NotCustomer),
        }
    }

    /// Fail unless this is an admin session.
    pub fn require_admin(&self) -> Result<()> {
        match self {
            Session::Admin => Ok(()),
            Session::Customer { .. } => Err(Error::NotAdmin),
        }
    }

    /// Header line naming the current user
    pub fn summary(&self) -> String {
        match self {
            Session::Admin => "Admin".to_string(),
            Session::Customer { acc_no, .. } => format!("Acc#: {acc_no}"),
        }
    }
}
