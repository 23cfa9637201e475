//! Mailer port: boundary to the outbound email collaborator.
//!
//! The collaborator is a pair of serverless functions invoked with a
//! JSON body; the payload structs here serialize to exactly that
//! contract (camelCase `userType`). Delivery itself is out of scope;
//! adapters decide what "dispatch" means.

use serde::Serialize;

use crate::domain::Role;

/// Payload for the "send OTP" function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpEmail {
    pub email: String,
    pub name: String,
    pub user_type: Role,
    pub otp: String,
}

/// Payload for the "send welcome credentials" function.
///
/// Carries the initial plaintext password: the admin-facing creation
/// flow mails first-login credentials to the new account holder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeEmail {
    pub email: String,
    pub name: String,
    pub user_type: Role,
    pub password: String,
}

/// Trait for outbound mail dispatch.
///
/// Callers treat dispatch as best-effort: a mail failure is logged and
/// never rolls back the primary operation (the OTP row or account is
/// created regardless).
pub trait Mailer: Send + Sync {
    /// Error type for dispatch failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Dispatch a one-time code to the account's email.
    ///
    /// # Errors
    /// Returns error if dispatch fails.
    fn send_otp(&self, message: &OtpEmail) -> Result<(), Self::Error>;

    /// Dispatch first-login credentials to a newly created account.
    ///
    /// # Errors
    /// Returns error if dispatch fails.
    fn send_welcome(&self, message: &WelcomeEmail) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_payload_contract() {
        let payload = OtpEmail {
            email: "asha@example.org".to_string(),
            name: "Asha Rao".to_string(),
            user_type: Role::Patient,
            otp: "042519".to_string(),
        };
        let json = serde_json::to_value(&payload).expect("Should serialize");
        assert_eq!(json["userType"], "user");
        assert_eq!(json["otp"], "042519");
    }

    #[test]
    fn test_welcome_payload_contract() {
        let payload = WelcomeEmail {
            email: "clinic@example.org".to_string(),
            name: "Dr. Rao".to_string(),
            user_type: Role::Doctor,
            password: "initial-password".to_string(),
        };
        let json = serde_json::to_value(&payload).expect("Should serialize");
        assert_eq!(json["userType"], "doctor");
        assert!(json.get("password").is_some());
    }
}
