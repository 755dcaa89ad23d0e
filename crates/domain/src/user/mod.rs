//! User accounts: registration and authentication.

mod entity;
mod repository;
mod service;

pub use entity::{Email, FullName, PasswordHash, User};
pub use repository::UserRepository;
pub use service::{PasswordHasher, RegisterUser, UserService};

use thiserror::Error;

/// Errors raised by user validation and account rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("User must be at least 18 years old, got {age}")]
    TooYoung { age: i32 },

    #[error("First name cannot be empty")]
    EmptyFirstName,

    #[error("Last name cannot be empty")]
    EmptyLastName,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password hash cannot be empty")]
    EmptyPasswordHash,

    #[error("Password must be at least {min} characters long")]
    WeakPassword { min: usize },

    /// An account already uses the email.
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,
}
