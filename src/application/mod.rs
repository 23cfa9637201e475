//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod accounts;
mod auth;
mod password;
mod recovery;
mod session;

pub use accounts::AccountService;
pub use auth::AuthService;
pub use password::{PasswordReset, PasswordService};
pub use recovery::RecoveryService;
pub use session::{SessionService, DEFAULT_SESSION_TTL_MINUTES};
