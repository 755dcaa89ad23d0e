//! Registration, login and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::{RegisterUser, User};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, parse_id};
use crate::state::{AppState, Backend};

// -- Request types --

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// -- Response types --

/// Public view of an account; the password hash is never serialized.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().as_str().to_string(),
            first_name: user.full_name().first_name().to_string(),
            last_name: user.full_name().last_name().to_string(),
            age: user.age(),
            is_married: user.is_married(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /v1/users/register: create an account.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<RegisterUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.users.register(req).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /v1/users/login: check credentials.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.authenticate(&req.email, &req.password).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /v1/users/{id}: load an account.
#[tracing::instrument(skip(state))]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id, "user")?;
    let user = state.users.get_by_id(id).await?;
    Ok(Json(UserResponse::from(&user)))
}
