//! # RapidCare Identity
//!
//! Authentication, session, and credential-recovery core for the
//! RapidCare healthcare administration system.
//!
//! This crate provides:
//! - per-role login (generated id or mobile number) for admin, doctor,
//!   hospital, and patient accounts
//! - OTP-based and knowledge-based ("village") password recovery
//! - server-validated opaque session tokens
//! - derived health metrics (age, BMI, obesity classification)
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (roles, accounts, OTP, sessions, metrics)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (SQLite, mail dispatch, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use domain::{HealthSummary, ObesityLevel, Role, Session, UserRole};

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Main error type for identity operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Store operation failed: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Credential operation failed: {0}")]
    Credential(#[from] domain::CredentialError),

    #[error("Mail dispatch failed: {0}")]
    Mail(#[from] adapters::MailError),

    #[error("Invalid input: {0}")]
    Validation(String),

    /// Generic login failure. Deliberately does not reveal whether the
    /// identifier was unknown or the password wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Generic recovery-start failure. Same enumeration-avoidance rule
    /// as [`IdentityError::InvalidCredentials`].
    #[error("Could not start recovery for the supplied details")]
    RecoveryFailed,

    #[error("Session is missing or expired")]
    InvalidSession,
}
