//! Mailer adapters: dispatch implementations for the email boundary.
//!
//! Actual delivery runs through an external serverless function and is
//! out of scope here. [`LogMailer`] serializes the JSON body the
//! function would receive and records dispatch metadata (never the
//! code or password). [`MemoryMailer`] captures messages for tests,
//! the same way the SQLite adapter offers `in_memory()`.

use std::sync::Mutex;

use crate::ports::{Mailer, OtpEmail, WelcomeEmail};

/// Error type for mail dispatch.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

/// Mailer that logs dispatch intent instead of delivering.
///
/// Used for local deployments without the email collaborator wired up.
#[derive(Debug, Default)]
pub struct LogMailer;

impl LogMailer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Mailer for LogMailer {
    type Error = MailError;

    fn send_otp(&self, message: &OtpEmail) -> Result<(), Self::Error> {
        let body = serde_json::to_string(message)?;
        // The sanitizing log writer redacts the address; the code itself
        // must not reach the log line at all.
        tracing::info!(
            user_type = %message.user_type,
            recipient = %message.email,
            body_bytes = body.len(),
            "Dispatching OTP email"
        );
        Ok(())
    }

    fn send_welcome(&self, message: &WelcomeEmail) -> Result<(), Self::Error> {
        let body = serde_json::to_string(message)?;
        tracing::info!(
            user_type = %message.user_type,
            recipient = %message.email,
            body_bytes = body.len(),
            "Dispatching welcome-credentials email"
        );
        Ok(())
    }
}

/// A dispatched message captured by [`MemoryMailer`].
#[derive(Debug, Clone)]
pub enum SentMail {
    Otp(OtpEmail),
    Welcome(WelcomeEmail),
}

/// Mailer that records every message in memory (for testing).
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every dispatch fails, for exercising the
    /// best-effort paths.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of everything dispatched so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("Lock failed").clone()
    }

    /// The last OTP code dispatched, if any.
    #[must_use]
    pub fn last_otp_code(&self) -> Option<String> {
        self.sent
            .lock()
            .expect("Lock failed")
            .iter()
            .rev()
            .find_map(|m| match m {
                SentMail::Otp(otp) => Some(otp.otp.clone()),
                SentMail::Welcome(_) => None,
            })
    }

    fn push(&self, mail: SentMail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Dispatch("mailer configured to fail".to_string()));
        }
        self.sent.lock().expect("Lock failed").push(mail);
        Ok(())
    }
}

impl Mailer for MemoryMailer {
    type Error = MailError;

    fn send_otp(&self, message: &OtpEmail) -> Result<(), Self::Error> {
        self.push(SentMail::Otp(message.clone()))
    }

    fn send_welcome(&self, message: &WelcomeEmail) -> Result<(), Self::Error> {
        self.push(SentMail::Welcome(message.clone()))
    }
}
