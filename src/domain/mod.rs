//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Records are normalized at the storage
//! boundary into these shapes, and derived values are always computed
//! here rather than persisted.

mod account;
pub mod credential;
pub mod metrics;
mod otp;
mod role;
mod session;

pub use account::{AdminAccount, NewUser, Profile, UserAccount};
pub use credential::CredentialError;
pub use metrics::{HealthSummary, ObesityLevel};
pub use otp::{OtpChallenge, MAX_OTP_ATTEMPTS, OTP_VALIDITY_MINUTES};
pub use role::{Role, RoleSchema, UserRole};
pub use session::Session;
