//! Identity store port: trait for persistent identity state.
//!
//! Abstracts the backing database (SQLite) from the application logic.
//! The four role tables are independently namespaced; every account
//! operation is scoped by [`UserRole`], and OTP rows are keyed by
//! (role, user id).

use chrono::{DateTime, Utc};

use crate::domain::{AdminAccount, OtpChallenge, Session, UserAccount, UserRole};

/// Trait for identity persistence operations.
pub trait IdentityStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    // --- accounts -------------------------------------------------------

    /// Insert a new user account into its role table.
    ///
    /// # Errors
    /// Returns error if the id already exists or the operation fails.
    fn insert_user(&self, account: &UserAccount) -> Result<(), Self::Error>;

    /// Look up an account by generated id.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn find_user_by_id(&self, role: UserRole, id: &str) -> Result<Option<UserAccount>, Self::Error>;

    /// Look up an account by phone number, whatever the role table
    /// calls that column.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn find_user_by_mobile(
        &self,
        role: UserRole,
        mobile: &str,
    ) -> Result<Option<UserAccount>, Self::Error>;

    /// Check whether an id is already taken in the role table.
    ///
    /// # Errors
    /// Returns error if the operation fails. Callers must treat a
    /// failure as "unknown", never as "available".
    fn user_id_exists(&self, role: UserRole, id: &str) -> Result<bool, Self::Error>;

    /// Overwrite the stored credential for a user.
    ///
    /// # Errors
    /// Returns error if the user does not exist or the operation fails.
    fn update_password(
        &self,
        role: UserRole,
        id: &str,
        password_hash: &str,
    ) -> Result<(), Self::Error>;

    /// Hard-delete an account (no tombstone).
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn delete_user(&self, role: UserRole, id: &str) -> Result<(), Self::Error>;

    // --- admin ----------------------------------------------------------

    /// Insert the seeded admin account.
    ///
    /// # Errors
    /// Returns error if the username is taken or the operation fails.
    fn insert_admin(&self, admin: &AdminAccount) -> Result<(), Self::Error>;

    /// Look up an admin by username.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>, Self::Error>;

    // --- one-time codes -------------------------------------------------

    /// Insert or overwrite the single OTP row for a user.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn upsert_otp(&self, challenge: &OtpChallenge) -> Result<(), Self::Error>;

    /// Load the pending OTP row for a user, if any.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn load_otp(&self, role: UserRole, user_id: &str) -> Result<Option<OtpChallenge>, Self::Error>;

    /// Increment the failed-attempt counter on a pending OTP row.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn record_otp_attempt(&self, role: UserRole, user_id: &str) -> Result<(), Self::Error>;

    /// Delete the OTP row for a user (reset cleanup).
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn delete_otp(&self, role: UserRole, user_id: &str) -> Result<(), Self::Error>;

    // --- sessions -------------------------------------------------------

    /// Persist a newly issued session.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn insert_session(&self, session: &Session) -> Result<(), Self::Error>;

    /// Look up a session by token.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn find_session(&self, token: &str) -> Result<Option<Session>, Self::Error>;

    /// Delete a session (logout or expiry).
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn delete_session(&self, token: &str) -> Result<(), Self::Error>;

    /// Delete every session that expired at or before `now`.
    /// Returns the number of rows removed.
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, Self::Error>;

    /// Count live session rows (active-session observability).
    ///
    /// # Errors
    /// Returns error if the operation fails.
    fn count_sessions(&self) -> Result<usize, Self::Error>;
}
