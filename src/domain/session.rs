//! Server-held session records.
//!
//! The token is an opaque random 256-bit hex string with no structure
//! to forge; it is only meaningful because a matching row exists
//! server-side. Every privileged call goes through
//! `SessionService::authenticate`, which looks the token up and checks
//! its expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// An active session, keyed by its opaque token.
///
/// Identity fields are cached on the row so role-gated screens can
/// populate headers without a second account lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Materialize a new session with a fresh token.
    #[must_use]
    pub fn issue(
        role: Role,
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: Option<String>,
        mobile: Option<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            token: generate_token(),
            user_id: user_id.into(),
            role,
            name: name.into(),
            email,
            mobile,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the session has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Generate an opaque session token: 32 random bytes, hex-encoded.
///
/// Uses ChaCha20 seeded from OS entropy to guarantee cryptographic
/// randomness on all platforms.
#[must_use]
pub fn generate_token() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let session = Session::issue(
            Role::Doctor,
            "1234567890",
            "Dr. Rao",
            None,
            None,
            now,
            Duration::hours(12),
        );
        assert!(!session.is_expired(now));
        assert!(!session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::seconds(1)));
    }
}
