//! Account service: admin-facing account creation and profile reads.
//!
//! Registration generates a collision-checked 10-digit id, hashes the
//! initial password, inserts the role-typed record, and mails first
//! login credentials best-effort. Profile reads recompute derived
//! metrics from raw inputs every time; nothing derived is persisted.

use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::adapters::StoreError;
use crate::domain::{credential, HealthSummary, NewUser, Profile, Role, UserAccount, UserRole};
use crate::ports::{IdentityStore, Mailer, WelcomeEmail};
use crate::{IdentityError, Result};

/// Length of generated identifiers.
const ID_LENGTH: usize = 10;

/// Collision re-rolls before giving up.
const MAX_ID_ATTEMPTS: usize = 32;

/// Service for creating and reading accounts.
pub struct AccountService<S, M> {
    store: Arc<S>,
    mailer: Arc<M>,
}

impl<S, M> AccountService<S, M>
where
    S: IdentityStore,
    S::Error: Into<StoreError>,
    M: Mailer,
{
    /// Create an account service.
    pub fn new(store: Arc<S>, mailer: Arc<M>) -> Self {
        Self { store, mailer }
    }

    /// Create a new account from the admin-facing form.
    ///
    /// The welcome email (initial credentials) is dispatched
    /// best-effort: a mail failure is logged and the account stands.
    ///
    /// # Errors
    /// Returns `Validation` for bad input, `Store` on persistence
    /// failure (including id-uniqueness check failures, which fail
    /// closed).
    pub fn register(&self, new_user: NewUser) -> Result<UserAccount> {
        new_user
            .validate()
            .map_err(|errors| IdentityError::Validation(errors.join("; ")))?;

        let role = new_user.profile.role();
        let id = self.generate_unique_id(role)?;
        let password_hash = credential::hash_password(&new_user.password)?;

        let account = UserAccount {
            id,
            name: new_user.name,
            mobile: new_user.mobile,
            email: new_user.email,
            password_hash,
            village: new_user.village,
            profile: new_user.profile,
            created_at: Utc::now(),
        };
        self.store
            .insert_user(&account)
            .map_err(|e| IdentityError::Store(e.into()))?;

        let message = WelcomeEmail {
            email: account.email.clone(),
            name: account.name.clone(),
            user_type: Role::from(role),
            password: new_user.password,
        };
        if let Err(e) = self.mailer.send_welcome(&message) {
            tracing::warn!(role = %role, "Welcome email dispatch failed: {e}");
        }

        tracing::info!(role = %role, "Created account");
        Ok(account)
    }

    /// Generate a 10-digit id that does not collide in the role table.
    ///
    /// A failed uniqueness lookup propagates as an error; it is never
    /// treated as "no collision". Bounded retries guard against a
    /// degenerate id space.
    ///
    /// # Errors
    /// Returns `Store` on lookup failure, `Validation` when
    /// [`MAX_ID_ATTEMPTS`] candidates all collided.
    pub fn generate_unique_id(&self, role: UserRole) -> Result<String> {
        let mut rng = ChaCha20Rng::from_entropy();

        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate: String = (0..ID_LENGTH)
                .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
                .collect();

            let taken = self
                .store
                .user_id_exists(role, &candidate)
                .map_err(|e| IdentityError::Store(e.into()))?;
            if !taken {
                return Ok(candidate);
            }
            tracing::debug!(role = %role, "Generated id collided, re-rolling");
        }

        Err(IdentityError::Validation(format!(
            "Could not find a free {role} id in {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Load an account by id.
    ///
    /// # Errors
    /// Returns `Store` on failure; `Ok(None)` when absent.
    pub fn get_user(&self, role: UserRole, id: &str) -> Result<Option<UserAccount>> {
        self.store
            .find_user_by_id(role, id)
            .map_err(|e| IdentityError::Store(e.into()))
    }

    /// Derived health metrics for a patient, recomputed from the
    /// stored raw inputs as of today.
    ///
    /// # Errors
    /// Returns `Validation` when the account is not a patient, `Store`
    /// on lookup failure; `Ok(None)` when the account is absent.
    pub fn health_summary(&self, id: &str) -> Result<Option<HealthSummary>> {
        let Some(account) = self.get_user(UserRole::Patient, id)? else {
            return Ok(None);
        };

        let Profile::Patient {
            date_of_birth,
            height_cm,
            weight_kg,
        } = account.profile
        else {
            return Err(IdentityError::Validation(
                "Account has no patient vitals".to_string(),
            ));
        };

        Ok(Some(HealthSummary::compute(
            date_of_birth,
            height_cm,
            weight_kg,
            Utc::now().date_naive(),
        )))
    }

    /// Hard-delete an account (no tombstone is kept).
    ///
    /// # Errors
    /// Returns `Store` on failure.
    pub fn delete_user(&self, role: UserRole, id: &str) -> Result<()> {
        self.store
            .delete_user(role, id)
            .map_err(|e| IdentityError::Store(e.into()))?;
        tracing::info!(role = %role, "Deleted account");
        Ok(())
    }
}
