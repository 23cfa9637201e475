//! Password service: credential updates and recovery cleanup.
//!
//! Confirmation equality and minimum strength are validated here, in
//! the component, not left to callers. A successful reset always
//! deletes any pending OTP row for the user, whichever recovery path
//! (OTP or village) led here.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::adapters::StoreError;
use crate::domain::{credential, Session, UserRole};
use crate::ports::IdentityStore;
use crate::{IdentityError, Result};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

/// A validated-on-use password reset request.
pub struct PasswordReset {
    pub role: UserRole,
    pub user_id: String,
    pub new_password: Zeroizing<String>,
    pub confirm_password: Zeroizing<String>,
}

/// Service for updating stored credentials.
pub struct PasswordService<S> {
    store: Arc<S>,
}

impl<S> PasswordService<S>
where
    S: IdentityStore,
    S::Error: Into<StoreError>,
{
    /// Create a password service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Overwrite a user's credential and clear any pending OTP.
    ///
    /// # Errors
    /// Returns `Validation` for mismatched or too-short passwords,
    /// `Store` if the user does not exist or the write fails.
    pub fn reset_password(&self, request: &PasswordReset) -> Result<()> {
        if request.new_password.as_str() != request.confirm_password.as_str() {
            return Err(IdentityError::Validation(
                "Passwords do not match".to_string(),
            ));
        }
        if request.new_password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let hash = credential::hash_password(&request.new_password)?;
        self.store
            .update_password(request.role, &request.user_id, &hash)
            .map_err(|e| IdentityError::Store(e.into()))?;

        // Cleanup regardless of which recovery factor was used.
        self.store
            .delete_otp(request.role, &request.user_id)
            .map_err(|e| IdentityError::Store(e.into()))?;

        tracing::info!(role = %request.role, "Password reset complete");
        Ok(())
    }

    /// Self-service password change for an authenticated session.
    ///
    /// Admins have no self-service change path; their session is
    /// rejected.
    ///
    /// # Errors
    /// Returns `InvalidSession` for admin sessions, otherwise the same
    /// contract as [`Self::reset_password`].
    pub fn change_password(
        &self,
        session: &Session,
        new_password: Zeroizing<String>,
        confirm_password: Zeroizing<String>,
    ) -> Result<()> {
        let Some(role) = session.role.as_user_role() else {
            tracing::warn!("Change-password rejected for admin session");
            return Err(IdentityError::InvalidSession);
        };

        self.reset_password(&PasswordReset {
            role,
            user_id: session.user_id.clone(),
            new_password,
            confirm_password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteIdentityStore;
    use crate::domain::{OtpChallenge, Profile, Role, UserAccount};
    use chrono::{Duration, NaiveDate, Utc};

    fn seeded_store() -> Arc<SqliteIdentityStore> {
        let store = Arc::new(SqliteIdentityStore::in_memory().expect("Should create db"));
        store
            .insert_user(&UserAccount {
                id: "1234567890".to_string(),
                name: "Asha Rao".to_string(),
                mobile: "9876543210".to_string(),
                email: "asha@example.org".to_string(),
                password_hash: credential::hash_password("old-password").expect("Should hash"),
                village: "Kodagu".to_string(),
                profile: Profile::Patient {
                    date_of_birth: NaiveDate::from_ymd_opt(2000, 6, 15).unwrap(),
                    height_cm: 165.0,
                    weight_kg: 68.0,
                },
                created_at: Utc::now(),
            })
            .expect("Should insert");
        store
    }

    fn reset(new: &str, confirm: &str) -> PasswordReset {
        PasswordReset {
            role: UserRole::Patient,
            user_id: "1234567890".to_string(),
            new_password: Zeroizing::new(new.to_string()),
            confirm_password: Zeroizing::new(confirm.to_string()),
        }
    }

    #[test]
    fn test_reset_updates_hash_and_clears_otp() {
        let store = seeded_store();
        let passwords = PasswordService::new(Arc::clone(&store));

        store
            .upsert_otp(&OtpChallenge::issue(UserRole::Patient, "1234567890", Utc::now()))
            .expect("Should upsert");

        passwords
            .reset_password(&reset("new-password-1", "new-password-1"))
            .expect("Should reset");

        let account = store
            .find_user_by_id(UserRole::Patient, "1234567890")
            .expect("Should query")
            .expect("Should exist");
        assert!(credential::verify_password("new-password-1", &account.password_hash)
            .expect("Should verify"));
        assert!(!credential::verify_password("old-password", &account.password_hash)
            .expect("Should verify"));

        assert!(store
            .load_otp(UserRole::Patient, "1234567890")
            .expect("Should load")
            .is_none());
    }

    #[test]
    fn test_mismatched_confirmation_rejected() {
        let passwords = PasswordService::new(seeded_store());
        let result = passwords.reset_password(&reset("new-password-1", "new-password-2"));
        assert!(matches!(result, Err(IdentityError::Validation(_))));
    }

    #[test]
    fn test_short_password_rejected() {
        let passwords = PasswordService::new(seeded_store());
        let result = passwords.reset_password(&reset("short", "short"));
        assert!(matches!(result, Err(IdentityError::Validation(_))));
    }

    #[test]
    fn test_unknown_user_rejected() {
        let passwords = PasswordService::new(seeded_store());
        let mut request = reset("new-password-1", "new-password-1");
        request.user_id = "0000000000".to_string();
        assert!(matches!(
            passwords.reset_password(&request),
            Err(IdentityError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_change_password_via_session() {
        let store = seeded_store();
        let passwords = PasswordService::new(Arc::clone(&store));

        let session = Session::issue(
            Role::Patient,
            "1234567890",
            "Asha Rao",
            None,
            None,
            Utc::now(),
            Duration::hours(12),
        );
        passwords
            .change_password(
                &session,
                Zeroizing::new("brand-new-password".to_string()),
                Zeroizing::new("brand-new-password".to_string()),
            )
            .expect("Should change");

        let account = store
            .find_user_by_id(UserRole::Patient, "1234567890")
            .expect("Should query")
            .expect("Should exist");
        assert!(
            credential::verify_password("brand-new-password", &account.password_hash)
                .expect("Should verify")
        );
    }

    #[test]
    fn test_admin_session_cannot_change_password() {
        let passwords = PasswordService::new(seeded_store());
        let session = Session::issue(
            Role::Admin,
            "root",
            "root",
            None,
            None,
            Utc::now(),
            Duration::hours(12),
        );
        let result = passwords.change_password(
            &session,
            Zeroizing::new("whatever-password".to_string()),
            Zeroizing::new("whatever-password".to_string()),
        );
        assert!(matches!(result, Err(IdentityError::InvalidSession)));
    }
}
