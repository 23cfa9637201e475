//! Session service: issuance and validation of server-held sessions.
//!
//! Session truth is a row in the store, not the presence of a token on
//! the client. Every privileged call authenticates its token here.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::adapters::StoreError;
use crate::domain::{Role, Session};
use crate::ports::IdentityStore;
use crate::{IdentityError, Result};

/// Default session lifetime in minutes (12 hours).
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 12 * 60;

/// Environment override for the session lifetime.
const SESSION_TTL_ENV: &str = "RAPIDCARE_SESSION_TTL_MINS";

/// Service managing session lifecycle.
pub struct SessionService<S> {
    store: Arc<S>,
    ttl: Duration,
}

impl<S> SessionService<S>
where
    S: IdentityStore,
    S::Error: Into<StoreError>,
{
    /// Create a session service with the default (or env-overridden) TTL.
    pub fn new(store: Arc<S>) -> Self {
        let minutes = std::env::var(SESSION_TTL_ENV)
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);
        Self::with_ttl(store, Duration::minutes(minutes))
    }

    /// Create a session service with an explicit TTL.
    pub fn with_ttl(store: Arc<S>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issue and persist a session for an authenticated principal.
    ///
    /// # Errors
    /// Returns error if the store operation fails.
    pub fn issue(
        &self,
        role: Role,
        user_id: &str,
        name: &str,
        email: Option<String>,
        mobile: Option<String>,
    ) -> Result<Session> {
        let session = Session::issue(role, user_id, name, email, mobile, Utc::now(), self.ttl);
        self.store
            .insert_session(&session)
            .map_err(|e| IdentityError::Store(e.into()))?;
        tracing::info!(role = %role, "Issued session");
        Ok(session)
    }

    /// Validate a token and return its session.
    ///
    /// Expired rows are deleted on sight.
    ///
    /// # Errors
    /// Returns [`IdentityError::InvalidSession`] for unknown or expired
    /// tokens.
    pub fn authenticate(&self, token: &str) -> Result<Session> {
        let session = self
            .store
            .find_session(token)
            .map_err(|e| IdentityError::Store(e.into()))?
            .ok_or(IdentityError::InvalidSession)?;

        if session.is_expired(Utc::now()) {
            if let Err(e) = self.store.delete_session(token) {
                let e: StoreError = e.into();
                tracing::warn!("Failed to delete expired session: {e:?}");
            }
            return Err(IdentityError::InvalidSession);
        }

        Ok(session)
    }

    /// Destroy a session. Unknown tokens are a no-op.
    ///
    /// # Errors
    /// Returns error if the store operation fails.
    pub fn logout(&self, token: &str) -> Result<()> {
        self.store
            .delete_session(token)
            .map_err(|e| IdentityError::Store(e.into()))?;
        tracing::info!("Session closed");
        Ok(())
    }

    /// Remove every expired session row. Returns the count removed.
    ///
    /// # Errors
    /// Returns error if the store operation fails.
    pub fn purge_expired(&self) -> Result<usize> {
        self.store
            .purge_expired_sessions(Utc::now())
            .map_err(|e| IdentityError::Store(e.into()))
    }

    /// Count live session rows.
    ///
    /// # Errors
    /// Returns error if the store operation fails.
    pub fn active_count(&self) -> Result<usize> {
        self.store
            .count_sessions()
            .map_err(|e| IdentityError::Store(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteIdentityStore;

    fn service() -> SessionService<SqliteIdentityStore> {
        let store = Arc::new(SqliteIdentityStore::in_memory().expect("Should create db"));
        SessionService::with_ttl(store, Duration::hours(12))
    }

    #[test]
    fn test_issue_then_authenticate() {
        let sessions = service();
        let issued = sessions
            .issue(Role::Doctor, "1234567890", "Dr. Rao", None, None)
            .expect("Should issue");

        let found = sessions.authenticate(&issued.token).expect("Should authenticate");
        assert_eq!(found.user_id, "1234567890");
        assert_eq!(found.role, Role::Doctor);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let sessions = service();
        let result = sessions.authenticate("not-a-real-token");
        assert!(matches!(result, Err(IdentityError::InvalidSession)));
    }

    #[test]
    fn test_expired_session_rejected_and_removed() {
        let store = Arc::new(SqliteIdentityStore::in_memory().expect("Should create db"));
        let sessions = SessionService::with_ttl(Arc::clone(&store), Duration::seconds(-1));

        let issued = sessions
            .issue(Role::Patient, "1234567890", "Asha Rao", None, None)
            .expect("Should issue");

        let result = sessions.authenticate(&issued.token);
        assert!(matches!(result, Err(IdentityError::InvalidSession)));
        assert_eq!(sessions.active_count().expect("Should count"), 0);
    }

    #[test]
    fn test_logout_destroys_session() {
        let sessions = service();
        let issued = sessions
            .issue(Role::Admin, "root", "root", None, None)
            .expect("Should issue");

        sessions.logout(&issued.token).expect("Should logout");
        assert!(sessions.authenticate(&issued.token).is_err());
    }
}
