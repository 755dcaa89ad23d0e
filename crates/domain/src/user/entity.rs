use chrono::{DateTime, Utc};
use common::UserId;
use serde::Serialize;

use super::UserError;

/// Minimum age for an account.
pub const MIN_AGE: i32 = 18;

/// A normalized (trimmed, lowercased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parses an address: exactly one `@` with non-empty parts on both sides
    /// and no whitespace.
    pub fn parse(raw: &str) -> Result<Self, UserError> {
        let email = raw.trim().to_lowercase();
        let mut parts = email.split('@');
        let valid = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !email.chars().any(char::is_whitespace)
            }
            _ => false,
        };
        if !valid {
            return Err(UserError::InvalidEmail);
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// First and last name, both trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullName {
    first_name: String,
    last_name: String,
}

impl FullName {
    pub fn new(first_name: &str, last_name: &str) -> Result<Self, UserError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() {
            return Err(UserError::EmptyFirstName);
        }
        if last_name.is_empty() {
            return Err(UserError::EmptyLastName);
        }
        Ok(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }
}

impl std::fmt::Display for FullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// An encoded password hash. The plain password never reaches this type.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: impl Into<String>) -> Result<Self, UserError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(UserError::EmptyPasswordHash);
        }
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    email: Email,
    full_name: FullName,
    age: i32,
    is_married: bool,
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a fresh identity. Fails if `age` is under 18.
    pub fn new(
        email: Email,
        full_name: FullName,
        age: i32,
        is_married: bool,
        password_hash: PasswordHash,
    ) -> Result<Self, UserError> {
        if age < MIN_AGE {
            return Err(UserError::TooYoung { age });
        }
        let now = Utc::now();
        Ok(Self {
            id: UserId::new(),
            email,
            full_name,
            age,
            is_married,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a user from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: UserId,
        email: Email,
        full_name: FullName,
        age: i32,
        is_married: bool,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            full_name,
            age,
            is_married,
            password_hash,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn full_name(&self) -> &FullName {
        &self.full_name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn is_married(&self) -> bool {
        self.is_married
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the stored password hash.
    pub fn change_password(&mut self, password_hash: PasswordHash) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }
}
