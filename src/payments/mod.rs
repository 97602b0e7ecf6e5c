//! Payments view: static and dynamic UPI QR codes plus Pay Now
//!
//! [`PaymentsView`] is the state behind the payments screen. Every user event
//! maps to one method; errors never escape as failures of the view, they land
//! in the status line instead.

mod submit;

pub use submit::{PayReceipt, PaySubmitter};

use crate::error::{Error, Result};
use crate::qr::{QrEncoder, QrSurface};
use crate::upi::{Currency, PaymentForm, QrMode};
use crate::view::StatusLine;
use std::path::{Path, PathBuf};
use tracing::debug;

/// State of the payments screen
#[derive(Debug, Clone)]
pub struct PaymentsView {
    mode: QrMode,
    currency: Currency,
    surface: QrSurface,
    status: Option<StatusLine>,
}

impl PaymentsView {
    /// Empty view in static mode
    pub fn new(encoder: QrEncoder, currency: Currency) -> Self {
        Self {
            mode: QrMode::Static,
            currency,
            surface: QrSurface::new(encoder),
            status: None,
        }
    }

    /// Active workflow
    pub fn mode(&self) -> QrMode {
        self.mode
    }

    /// Currency used for generated links
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// The QR surface
    pub fn surface(&self) -> &QrSurface {
        &self.surface
    }

    /// Latest status message
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Switch workflow; the code and messages are cleared.
    pub fn switch_mode(&mut self, mode: QrMode) {
        self.mode = mode;
        self.surface.clear();
        self.status = None;
    }

    /// Static mode "generate" action.
    pub fn generate_static(&mut self, form: &PaymentForm) {
        self.mode = QrMode::Static;
        match self.render_form(form) {
            Ok(()) => self.status = Some(StatusLine::success("Static QR generated")),
            Err(err) => self.status = Some(StatusLine::error(err.user_message())),
        }
    }

    /// Dynamic mode: called after every edit of the form.
    ///
    /// A blank payee clears the code rather than leaving a stale one visible.
    pub fn update_dynamic(&mut self, form: &PaymentForm) {
        self.mode = QrMode::Dynamic;
        match self.render_form(form) {
            Ok(()) => self.status = Some(StatusLine::success("QR updated")),
            Err(err) => {
                self.surface.clear();
                self.status = Some(StatusLine::error(err.user_message()));
            }
        }
    }

    fn render_form(&mut self, form: &PaymentForm) -> Result<()> {
        let intent = form.qr_intent(self.mode, &self.currency)?;
        let uri = intent.to_uri();
        debug!(mode = self.mode.label(), %uri, "rendering payment QR");
        self.surface.render(&uri)?;
        Ok(())
    }

    /// "Clear QR" action
    pub fn clear(&mut self) {
        self.surface.clear();
        self.status = Some(StatusLine::info("QR cleared"));
    }

    /// Write the visible code into `dir` under the mode's file name.
    pub fn export(&mut self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.mode.export_file_name());
        match self.surface.export_png(&path) {
            Ok(path) => {
                self.status = Some(StatusLine::success(format!(
                    "Saved {}",
                    path.display()
                )));
                Ok(path)
            }
            Err(err) => {
                self.status = Some(StatusLine::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Reflect the outcome of a Pay Now submission.
    ///
    /// The confirmed payment's code is drawn only after the backend accepted it.
    /// A rejected or failed payment clears the code so nothing on screen can pass
    /// for a confirmation.
    pub fn apply_payment(&mut self, outcome: &Result<PayReceipt>) {
        match outcome {
            Ok(receipt) => {
                let status = match self.surface.render(&receipt.uri) {
                    Ok(_) => StatusLine::success(receipt.message.clone()),
                    Err(err) => StatusLine::success(format!(
                        "{} ({})",
                        receipt.message,
                        err.user_message()
                    )),
                };
                self.status = Some(status);
            }
            Err(err @ (Error::Validation(_) | Error::Busy | Error::NotCustomer)) => {
                self.status = Some(StatusLine::error(err.user_message()));
            }
            Err(err) => {
                self.surface.clear();
                self.status = Some(StatusLine::error(err.user_message()));
            }
        }
    }
}
