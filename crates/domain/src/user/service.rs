//! Registration and authentication service.

use common::UserId;
use serde::Deserialize;

use super::{Email, FullName, PasswordHash, User, UserError, UserRepository};
use crate::error::{DomainError, StoreError};
use crate::transaction::{Conn, TransactionManager, finish};

/// Minimum length of a plain-text password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes and verifies passwords.
pub trait PasswordHasher: Send + Sync {
    /// Produces a self-describing encoded hash of `password`.
    fn hash(&self, password: &str) -> String;

    /// Returns true if `password` matches the encoded `hash`.
    fn verify(&self, hash: &str, password: &str) -> bool;
}

/// Input for [`UserService::register`].
#[derive(Clone, Deserialize)]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: i32,
    #[serde(default)]
    pub is_married: bool,
    pub password: String,
}

impl std::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("is_married", &self.is_married)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Service for user accounts.
pub struct UserService<U, T, H> {
    users: U,
    transactions: T,
    hasher: H,
}

impl<U, T, H> UserService<U, T, H>
where
    T: TransactionManager,
    U: UserRepository<Tx = T::Tx>,
    H: PasswordHasher,
{
    pub fn new(users: U, transactions: T, hasher: H) -> Self {
        Self {
            users,
            transactions,
            hasher,
        }
    }

    /// Registers a new account.
    ///
    /// All input is validated and the password hashed before the database is
    /// touched. The email uniqueness check and the insert share one
    /// transaction.
    #[tracing::instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn register(&self, cmd: RegisterUser) -> Result<User, DomainError> {
        let full_name = FullName::new(&cmd.first_name, &cmd.last_name)?;
        let email = Email::parse(&cmd.email)?;
        if cmd.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let password_hash = PasswordHash::new(self.hasher.hash(&cmd.password))?;
        let user = User::new(email, full_name, cmd.age, cmd.is_married, password_hash)?;

        let mut tx = self.transactions.begin().await?;
        let outcome = self.insert_unique(&mut tx, &user).await;
        finish(tx, outcome).await?;

        metrics::counter!("users_registered_total").increment(1);
        tracing::info!(user_id = %user.id(), "user registered");
        Ok(user)
    }

    /// Loads a user by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: UserId) -> Result<User, DomainError> {
        Ok(self.users.get_by_id(Conn::Pool, id).await?)
    }

    /// Loads a user by email.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<User, DomainError> {
        let email = Email::parse(email)?;
        Ok(self.users.get_by_email(Conn::Pool, &email).await?)
    }

    /// Checks an email/password pair.
    ///
    /// An unknown email and a wrong password both yield
    /// [`UserError::InvalidCredentials`].
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = Email::parse(email).map_err(|_| UserError::InvalidCredentials)?;

        let user = match self.users.get_by_email(Conn::Pool, &email).await {
            Ok(user) => user,
            Err(StoreError::UserNotFound(_)) => return Err(UserError::InvalidCredentials.into()),
            Err(err) => return Err(err.into()),
        };

        if !self.hasher.verify(user.password_hash().as_str(), password) {
            return Err(UserError::InvalidCredentials.into());
        }
        Ok(user)
    }

    async fn insert_unique(&self, tx: &mut T::Tx, user: &User) -> Result<(), DomainError> {
        match self.users.get_by_email(Conn::Tx(&mut *tx), user.email()).await {
            Ok(_) => return Err(UserError::AlreadyExists(user.email().to_string()).into()),
            Err(StoreError::UserNotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        match self.users.create(Conn::Tx(tx), user).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate(_)) => {
                Err(UserError::AlreadyExists(user.email().to_string()).into())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::{InMemoryTransactionManager, InMemoryUserRepository, MemoryDatabase};

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> String {
            format!("plain${password}")
        }

        fn verify(&self, hash: &str, password: &str) -> bool {
            hash.strip_prefix("plain$") == Some(password)
        }
    }

    type Service = UserService<InMemoryUserRepository, InMemoryTransactionManager, PlainHasher>;

    fn service() -> Service {
        let db = MemoryDatabase::new();
        UserService::new(db.users(), db.transactions(), PlainHasher)
    }

    fn input(email: &str, age: i32) -> RegisterUser {
        RegisterUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            age,
            is_married: false,
            password: "correct horse".into(),
        }
    }

    #[tokio::test]
    async fn test_register_and_load() {
        let service = service();

        let user = service.register(input("Ada@Example.com", 25)).await.unwrap();

        assert_eq!(user.email().as_str(), "ada@example.com");
        assert_eq!(user.password_hash().as_str(), "plain$correct horse");
        assert_eq!(service.get_by_id(user.id()).await.unwrap(), user);
        assert_eq!(service.get_by_email("ada@example.com").await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let service = service();
        service.register(input("ada@example.com", 25)).await.unwrap();

        let err = service
            .register(input(" ADA@example.com", 30))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::User(UserError::AlreadyExists(_))));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();

        let young = service.register(input("kid@example.com", 17)).await.unwrap_err();
        assert!(matches!(young, DomainError::User(UserError::TooYoung { age: 17 })));

        let mut weak = input("weak@example.com", 30);
        weak.password = "short".into();
        let err = service.register(weak).await.unwrap_err();
        assert!(matches!(err, DomainError::User(UserError::WeakPassword { min: 8 })));

        let err = service.register(input("not-an-email", 30)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(matches!(
            service.get_by_email("kid@example.com").await,
            Err(DomainError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = service();
        let user = service.register(input("ada@example.com", 25)).await.unwrap();

        let found = service
            .authenticate("ada@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(found.id(), user.id());

        let wrong_password = service
            .authenticate("ada@example.com", "battery staple")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate("bob@example.com", "correct horse")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.kind(), ErrorKind::Unauthorized);
        assert_eq!(unknown_email.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_register_input_debug_hides_password() {
        let debug = format!("{:?}", input("ada@example.com", 25));
        assert!(!debug.contains("correct horse"));
    }
}
