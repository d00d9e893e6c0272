//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Role, User};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, AuthTokens, CreateUserInput};
use crate::services::AuthzService;
use crate::AppState;

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response after creating a user
#[derive(Debug, serde::Serialize)]
pub struct CreateUserResponse {
    pub user_id: Uuid,
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.username, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for new tokens
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}

/// Roles available for user accounts
pub async fn list_roles(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Role>>> {
    let service = AuthService::new(state.db, &state.config);
    let roles = service.list_roles().await?;
    Ok(Json(roles))
}

/// Create a user account (requires users:create)
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<CreateUserResponse>> {
    let authz = AuthzService::new(state.db.clone());
    let service = AuthService::new(state.db, &state.config);
    let user = &current_user.0;

    let detail = format!("create user {}", input.username);
    let user_id = authz
        .guard(user, "users", "create", &detail, || {
            service.create_user(input)
        })
        .await?;

    Ok(Json(CreateUserResponse { user_id }))
}
