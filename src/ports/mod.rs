//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (database, outbound
//! email collaborator).

mod mailer;
mod store;

pub use mailer::{Mailer, OtpEmail, WelcomeEmail};
pub use store::IdentityStore;
