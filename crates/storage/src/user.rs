use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::{Conn, Email, FullName, PasswordHash, StoreError, User, UserRepository};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{db_error, decode_error};
use crate::transaction::{PgTransaction, executor};

const COLUMNS: &str =
    "id, email, first_name, last_name, age, is_married, password_hash, created_at, updated_at";

/// PostgreSQL-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: PgRow) -> Result<User, StoreError> {
        let decode = |row: &PgRow| -> Result<_, sqlx::Error> {
            Ok((
                row.try_get::<Uuid, _>("id")?,
                row.try_get::<String, _>("email")?,
                row.try_get::<String, _>("first_name")?,
                row.try_get::<String, _>("last_name")?,
                row.try_get::<i32, _>("age")?,
                row.try_get::<bool, _>("is_married")?,
                row.try_get::<String, _>("password_hash")?,
                row.try_get::<DateTime<Utc>, _>("created_at")?,
                row.try_get::<DateTime<Utc>, _>("updated_at")?,
            ))
        };
        let (id, email, first, last, age, is_married, hash, created_at, updated_at) =
            decode(&row).map_err(db_error("failed to read user"))?;

        Ok(User::restore(
            UserId::from_uuid(id),
            Email::parse(&email).map_err(|e| decode_error("user email", e))?,
            FullName::new(&first, &last).map_err(|e| decode_error("user name", e))?,
            age,
            is_married,
            PasswordHash::new(hash).map_err(|e| decode_error("user password hash", e))?,
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    type Tx = PgTransaction;

    async fn create(&self, conn: Conn<'_, PgTransaction>, user: &User) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        sqlx::query(&format!(
            "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(user.id().as_uuid())
        .bind(user.email().as_str())
        .bind(user.full_name().first_name())
        .bind(user.full_name().last_name())
        .bind(user.age())
        .bind(user.is_married())
        .bind(user.password_hash().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to insert user"))?;
        Ok(())
    }

    async fn get_by_id(
        &self,
        conn: Conn<'_, PgTransaction>,
        id: UserId,
    ) -> Result<User, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *exec)
            .await
            .map_err(db_error("failed to fetch user"))?
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))?;

        Self::row_to_user(row)
    }

    async fn get_by_email(
        &self,
        conn: Conn<'_, PgTransaction>,
        email: &Email,
    ) -> Result<User, StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&mut *exec)
            .await
            .map_err(db_error("failed to fetch user"))?
            .ok_or_else(|| StoreError::UserNotFound(email.to_string()))?;

        Self::row_to_user(row)
    }

    async fn update(&self, conn: Conn<'_, PgTransaction>, user: &User) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, age = $5,
                is_married = $6, password_hash = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email().as_str())
        .bind(user.full_name().first_name())
        .bind(user.full_name().last_name())
        .bind(user.age())
        .bind(user.is_married())
        .bind(user.password_hash().as_str())
        .bind(user.updated_at())
        .execute(&mut *exec)
        .await
        .map_err(db_error("failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(user.id().to_string()));
        }
        Ok(())
    }

    async fn delete(&self, conn: Conn<'_, PgTransaction>, id: UserId) -> Result<(), StoreError> {
        let mut exec = executor(&self.pool, conn).await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *exec)
            .await
            .map_err(db_error("failed to delete user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound(id.to_string()));
        }
        Ok(())
    }
}
