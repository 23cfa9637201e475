//! Recovery service: OTP issuance/verification and village checks.
//!
//! Two linear wizard paths feed this service:
//! mobile -> village check -> reset, and
//! user id -> send OTP -> verify OTP -> reset.
//! Both end at `PasswordService::reset_password`, which also clears any
//! pending OTP row.

use std::sync::Arc;

use chrono::Utc;

use crate::adapters::StoreError;
use crate::domain::{OtpChallenge, Role, UserRole};
use crate::ports::{IdentityStore, Mailer, OtpEmail};
use crate::{IdentityError, Result};

/// Service for starting and checking identity-recovery factors.
pub struct RecoveryService<S, M> {
    store: Arc<S>,
    mailer: Arc<M>,
}

impl<S, M> RecoveryService<S, M>
where
    S: IdentityStore,
    S::Error: Into<StoreError>,
    M: Mailer,
{
    /// Create a recovery service.
    pub fn new(store: Arc<S>, mailer: Arc<M>) -> Self {
        Self { store, mailer }
    }

    /// Start OTP recovery: resolve the mobile number, issue a fresh
    /// code (overwriting any pending challenge), and dispatch it to the
    /// account's email. Returns the resolved user id so the wizard can
    /// continue to the verify step.
    ///
    /// Mail dispatch is best-effort: a failure is logged and the OTP
    /// row stays in place.
    ///
    /// # Errors
    /// Returns [`IdentityError::RecoveryFailed`] when no account
    /// matches the mobile number; store failures propagate.
    pub fn send_otp(&self, role: UserRole, mobile: &str) -> Result<String> {
        let Some(account) = self
            .store
            .find_user_by_mobile(role, mobile)
            .map_err(|e| IdentityError::Store(e.into()))?
        else {
            tracing::warn!(role = %role, "Recovery start failed: no account for mobile");
            return Err(IdentityError::RecoveryFailed);
        };

        let challenge = OtpChallenge::issue(role, &account.id, Utc::now());
        self.store
            .upsert_otp(&challenge)
            .map_err(|e| IdentityError::Store(e.into()))?;

        let message = OtpEmail {
            email: account.email.clone(),
            name: account.name.clone(),
            user_type: Role::from(role),
            otp: challenge.code.clone(),
        };
        if let Err(e) = self.mailer.send_otp(&message) {
            // The challenge stands; the user can retry delivery.
            tracing::warn!(role = %role, "OTP email dispatch failed: {e}");
        }

        tracing::info!(role = %role, "Issued recovery OTP");
        Ok(account.id)
    }

    /// Check a supplied one-time code.
    ///
    /// `Ok(false)` covers every rejection: no pending challenge,
    /// expired code (regardless of correctness), exhausted attempts, or
    /// a plain mismatch. Mismatches increment the attempt counter; the
    /// row is never deleted here, so a locked challenge stays locked
    /// until a fresh code is issued.
    ///
    /// # Errors
    /// Returns error only on store failure.
    pub fn verify_otp(&self, role: UserRole, user_id: &str, code: &str) -> Result<bool> {
        let Some(challenge) = self
            .store
            .load_otp(role, user_id)
            .map_err(|e| IdentityError::Store(e.into()))?
        else {
            tracing::warn!(role = %role, "OTP check failed: no pending challenge");
            return Ok(false);
        };

        let now = Utc::now();
        if challenge.is_expired(now) {
            tracing::warn!(role = %role, "OTP check failed: challenge expired");
            return Ok(false);
        }
        if challenge.is_locked() {
            tracing::warn!(role = %role, "OTP check failed: attempts exhausted");
            return Ok(false);
        }

        if !challenge.verify(code, now) {
            self.store
                .record_otp_attempt(role, user_id)
                .map_err(|e| IdentityError::Store(e.into()))?;
            tracing::warn!(role = %role, "OTP check failed: code mismatch");
            return Ok(false);
        }

        Ok(true)
    }

    /// Check the knowledge-based recovery factor: case-insensitive,
    /// whitespace-trimmed comparison against the stored village.
    ///
    /// # Errors
    /// Returns error only on store failure.
    pub fn verify_village(&self, role: UserRole, user_id: &str, village: &str) -> Result<bool> {
        let Some(account) = self
            .store
            .find_user_by_id(role, user_id)
            .map_err(|e| IdentityError::Store(e.into()))?
        else {
            tracing::warn!(role = %role, "Village check failed: unknown user");
            return Ok(false);
        };

        let matches = account
            .village
            .trim()
            .eq_ignore_ascii_case(village.trim());
        if !matches {
            tracing::warn!(role = %role, "Village check failed: mismatch");
        }
        Ok(matches)
    }
}
