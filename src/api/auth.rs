//! Registration and authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::profile::{Account, Profile, RegisterRequest},
};

use super::AuthenticatedUser;

/// Public account representation (no credentials)
#[derive(Serialize, ToSchema)]
pub struct AccountInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            is_active: account.is_active,
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
        }
    }
}

/// Registration response
#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
    pub profile: Profile,
}

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Extends the token lifetime when true
    pub remember_me: Option<bool>,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub account: AccountInfo,
    pub profile: Option<Profile>,
}

/// Current user response
#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub account: AccountInfo,
    pub profile: Option<Profile>,
}

/// Register a new student or librarian account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, pending approval", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or ID number already registered")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let role = request.role;
    let (account, profile) = state.services.accounts.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!(
                "Account created successfully! Your {} account is pending admin approval.",
                role
            ),
            username: account.username,
            profile,
        }),
    ))
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials or account not approved")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, account, profile) = state
        .services
        .accounts
        .authenticate(
            &request.email,
            &request.password,
            request.remember_me.unwrap_or(false),
        )
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        account: AccountInfo::from(&account),
        profile,
    }))
}

/// Get the current account and profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MeResponse>> {
    let (account, profile) = state.services.accounts.current_user(&claims).await?;

    Ok(Json(MeResponse {
        account: AccountInfo::from(&account),
        profile,
    }))
}
