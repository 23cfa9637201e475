//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external systems:
//! - `sqlite`: SQLite for identity, OTP, and session persistence
//! - `mailer`: dispatch adapters for the outbound email boundary
//! - `sanitize`: PII filtering for logs

pub mod mailer;
pub mod sanitize;
pub mod sqlite;

// Re-export adapter errors for lib.rs
pub use mailer::MailError;
pub use sqlite::StoreError;
