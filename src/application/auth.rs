//! Authentication service: credential checks and session issuance.
//!
//! Lookups run against the role's own table, by generated id or phone
//! number (the hospital table keeps its number under `mobile_number`;
//! the schema map hides that here). Record-not-found and
//! password-mismatch are distinguished in logs only; callers always get
//! the same generic error so login cannot be used to enumerate
//! accounts.

use std::sync::Arc;

use crate::adapters::StoreError;
use crate::domain::{credential, Role, Session, UserAccount, UserRole};
use crate::ports::IdentityStore;
use crate::{IdentityError, Result};

use super::SessionService;

/// Service for logging principals in.
pub struct AuthService<S> {
    store: Arc<S>,
    sessions: SessionService<S>,
}

impl<S> AuthService<S>
where
    S: IdentityStore,
    S::Error: Into<StoreError>,
{
    /// Create an auth service sharing the given store.
    pub fn new(store: Arc<S>) -> Self {
        let sessions = SessionService::new(Arc::clone(&store));
        Self { store, sessions }
    }

    /// Log in with a generated id.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidCredentials`] on unknown id or
    /// wrong password; store failures propagate as `Store`.
    pub fn login(&self, role: UserRole, id: &str, password: &str) -> Result<Session> {
        let account = self
            .store
            .find_user_by_id(role, id)
            .map_err(|e| IdentityError::Store(e.into()))?;
        self.complete_user_login(role, account, password)
    }

    /// Log in with a phone number.
    ///
    /// # Errors
    /// Same contract as [`Self::login`].
    pub fn login_with_mobile(&self, role: UserRole, mobile: &str, password: &str) -> Result<Session> {
        let account = self
            .store
            .find_user_by_mobile(role, mobile)
            .map_err(|e| IdentityError::Store(e.into()))?;
        self.complete_user_login(role, account, password)
    }

    /// Log in as the seeded administrator.
    ///
    /// # Errors
    /// Same generic-failure contract as [`Self::login`].
    pub fn login_admin(&self, username: &str, password: &str) -> Result<Session> {
        let Some(admin) = self
            .store
            .find_admin(username)
            .map_err(|e| IdentityError::Store(e.into()))?
        else {
            tracing::warn!("Admin login failed: unknown username");
            return Err(IdentityError::InvalidCredentials);
        };

        if !credential::verify_password(password, &admin.password_hash)? {
            tracing::warn!("Admin login failed: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        self.sessions
            .issue(Role::Admin, &admin.username, &admin.username, None, None)
    }

    /// Shared tail of both user login paths: verify and materialize.
    fn complete_user_login(
        &self,
        role: UserRole,
        account: Option<UserAccount>,
        password: &str,
    ) -> Result<Session> {
        let Some(account) = account else {
            tracing::warn!(role = %role, "Login failed: no matching record");
            return Err(IdentityError::InvalidCredentials);
        };

        if !credential::verify_password(password, &account.password_hash)? {
            tracing::warn!(role = %role, "Login failed: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }

        self.sessions.issue(
            Role::from(role),
            &account.id,
            &account.name,
            Some(account.email.clone()),
            Some(account.mobile.clone()),
        )
    }

    /// The session service backing this auth service.
    #[must_use]
    pub fn sessions(&self) -> &SessionService<S> {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteIdentityStore;
    use crate::domain::{AdminAccount, Profile};
    use chrono::{NaiveDate, Utc};

    fn store_with_patient(password: &str) -> Arc<SqliteIdentityStore> {
        let store = Arc::new(SqliteIdentityStore::in_memory().expect("Should create db"));
        let account = UserAccount {
            id: "1234567890".to_string(),
            name: "Asha Rao".to_string(),
            mobile: "9876543210".to_string(),
            email: "asha@example.org".to_string(),
            password_hash: credential::hash_password(password).expect("Should hash"),
            village: "Kodagu".to_string(),
            profile: Profile::Patient {
                date_of_birth: NaiveDate::from_ymd_opt(2000, 6, 15).unwrap(),
                height_cm: 165.0,
                weight_kg: 68.0,
            },
            created_at: Utc::now(),
        };
        store.insert_user(&account).expect("Should insert");
        store
    }

    #[test]
    fn test_login_by_id() {
        let store = store_with_patient("a-good-password");
        let auth = AuthService::new(store);

        let session = auth
            .login(UserRole::Patient, "1234567890", "a-good-password")
            .expect("Should log in");
        assert_eq!(session.role, Role::Patient);
        assert_eq!(session.user_id, "1234567890");
        assert_eq!(session.mobile.as_deref(), Some("9876543210"));

        // The issued token authenticates.
        auth.sessions().authenticate(&session.token).expect("Should authenticate");
    }

    #[test]
    fn test_login_by_mobile() {
        let store = store_with_patient("a-good-password");
        let auth = AuthService::new(store);

        let session = auth
            .login_with_mobile(UserRole::Patient, "9876543210", "a-good-password")
            .expect("Should log in");
        assert_eq!(session.user_id, "1234567890");
    }

    #[test]
    fn test_wrong_password_leaves_no_session() {
        let store = store_with_patient("a-good-password");
        let auth = AuthService::new(Arc::clone(&store));

        let result = auth.login(UserRole::Patient, "1234567890", "wrong");
        assert!(matches!(result, Err(IdentityError::InvalidCredentials)));
        assert_eq!(store.count_sessions().expect("Should count"), 0);
    }

    #[test]
    fn test_unknown_id_same_error_as_mismatch() {
        let store = store_with_patient("a-good-password");
        let auth = AuthService::new(store);

        let unknown = auth.login(UserRole::Patient, "0000000000", "a-good-password");
        let mismatch = auth.login(UserRole::Patient, "1234567890", "wrong");
        assert_eq!(
            unknown.unwrap_err().to_string(),
            mismatch.unwrap_err().to_string()
        );
    }

    #[test]
    fn test_role_tables_are_isolated() {
        let store = store_with_patient("a-good-password");
        let auth = AuthService::new(store);

        // The id exists in patients, not doctors.
        let result = auth.login(UserRole::Doctor, "1234567890", "a-good-password");
        assert!(matches!(result, Err(IdentityError::InvalidCredentials)));
    }

    #[test]
    fn test_admin_login() {
        let store = Arc::new(SqliteIdentityStore::in_memory().expect("Should create db"));
        store
            .insert_admin(&AdminAccount {
                username: "root".to_string(),
                password_hash: credential::hash_password("admin-password").expect("Should hash"),
                created_at: Utc::now(),
            })
            .expect("Should insert");

        let auth = AuthService::new(store);
        let session = auth.login_admin("root", "admin-password").expect("Should log in");
        assert_eq!(session.role, Role::Admin);

        assert!(auth.login_admin("root", "nope").is_err());
        assert!(auth.login_admin("ghost", "admin-password").is_err());
    }
}
