//! One-time codes for the password-recovery flow.
//!
//! At most one live challenge exists per (role, user); issuing a new
//! code overwrites the previous row. A challenge is valid only while
//! `now <= valid_until`, and expiry takes precedence over code
//! correctness. Failed attempts are counted; after
//! [`MAX_OTP_ATTEMPTS`] the challenge is locked until a fresh code is
//! issued.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::role::UserRole;

/// How long an issued code stays valid.
pub const OTP_VALIDITY_MINUTES: i64 = 10;

/// Failed verifications allowed before the challenge locks.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// A pending one-time code for a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub role: UserRole,
    pub user_id: String,
    /// 6-digit numeric code, kept as a string to preserve leading zeros.
    #[serde(skip_serializing)]
    pub code: String,
    pub valid_until: DateTime<Utc>,
    /// Failed verification attempts against this code.
    pub attempts: u32,
}

impl OtpChallenge {
    /// Issue a fresh challenge valid for [`OTP_VALIDITY_MINUTES`].
    #[must_use]
    pub fn issue(role: UserRole, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            role,
            user_id: user_id.into(),
            code: generate_code(),
            valid_until: now + Duration::minutes(OTP_VALIDITY_MINUTES),
            attempts: 0,
        }
    }

    /// Whether the challenge has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Whether the attempt counter has exhausted the challenge.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.attempts >= MAX_OTP_ATTEMPTS
    }

    /// Check a supplied code. Expiry and lockout take precedence: an
    /// expired or locked challenge never verifies, even with the
    /// correct code.
    #[must_use]
    pub fn verify(&self, supplied: &str, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) || self.is_locked() {
            return false;
        }
        self.code == supplied
    }
}

/// Generate a 6-digit numeric code using a CSPRNG.
///
/// ChaCha20 seeded from OS entropy, same source as session tokens, so
/// codes are not predictable from one another.
#[must_use]
pub fn generate_code() -> String {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    format!("{:06}", rng.gen_range(0..1_000_000u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_verify_correct_code() {
        let now = Utc::now();
        let otp = OtpChallenge::issue(UserRole::Patient, "1234567890", now);
        assert!(otp.verify(&otp.code.clone(), now));
        assert!(!otp.verify("000000", now) || otp.code == "000000");
    }

    #[test]
    fn test_expiry_beats_correctness() {
        let now = Utc::now();
        let mut otp = OtpChallenge::issue(UserRole::Doctor, "1111111111", now);
        otp.valid_until = now - Duration::seconds(1);
        assert!(!otp.verify(&otp.code.clone(), now));
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let otp = OtpChallenge::issue(UserRole::Hospital, "2222222222", now);
        assert_eq!(otp.valid_until, now + Duration::minutes(OTP_VALIDITY_MINUTES));
        // Exactly at the boundary the code is still valid.
        assert!(!otp.is_expired(otp.valid_until));
        assert!(otp.is_expired(otp.valid_until + Duration::seconds(1)));
    }

    #[test]
    fn test_lockout() {
        let now = Utc::now();
        let mut otp = OtpChallenge::issue(UserRole::Patient, "3333333333", now);
        otp.attempts = MAX_OTP_ATTEMPTS;
        assert!(otp.is_locked());
        assert!(!otp.verify(&otp.code.clone(), now));
    }
}
