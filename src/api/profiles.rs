//! Profile management and approval endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::profile::{Profile, ProfileQuery, ProfileSummary, RejectRequest},
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// List profiles with filters and pagination
#[utoipa::path(
    get,
    path = "/profiles",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by approval status (pending, approved, rejected)"),
        ("role" = Option<String>, Query, description = "Filter by role (student, librarian)"),
        ("search" = Option<String>, Query, description = "Search by name or ID number"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Profiles per page (default: 10)")
    ),
    responses(
        (status = 200, description = "List of profiles", body = PaginatedResponse<ProfileSummary>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_profiles(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ProfileQuery>,
) -> AppResult<Json<PaginatedResponse<ProfileSummary>>> {
    claims.require_staff()?;

    let (profiles, total) = state.services.accounts.search_profiles(&query).await?;

    Ok(Json(PaginatedResponse {
        items: profiles,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(10),
    }))
}

/// Get profile details by ID
#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Profile ID")
    ),
    responses(
        (status = 200, description = "Profile details", body = Profile),
        (status = 403, description = "Not the owner and not staff"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Profile>> {
    claims.require_self_or_staff(id)?;

    let profile = state.services.accounts.get_profile(id).await?;
    Ok(Json(profile))
}

/// Approve a pending profile
#[utoipa::path(
    post,
    path = "/profiles/{id}/approve",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Profile ID")
    ),
    responses(
        (status = 200, description = "Profile approved, login reactivated", body = Profile),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Profile not found"),
        (status = 409, description = "Profile already processed")
    )
)]
pub async fn approve_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Profile>> {
    claims.require_superuser()?;

    let profile = state
        .services
        .accounts
        .approve(id, claims.account_id)
        .await?;
    Ok(Json(profile))
}

/// Reject a pending profile
#[utoipa::path(
    post,
    path = "/profiles/{id}/reject",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Profile ID")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Profile rejected", body = Profile),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Profile not found"),
        (status = 409, description = "Profile already processed")
    )
)]
pub async fn reject_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<Profile>> {
    claims.require_superuser()?;

    let profile = state
        .services
        .accounts
        .reject(id, claims.account_id, request.reason)
        .await?;
    Ok(Json(profile))
}

/// Delete a profile and its login account
#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Profile ID"),
        ("force" = Option<bool>, Query, description = "Force delete even with active loans")
    ),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Profile not found"),
        (status = 422, description = "Student has active loans")
    )
)]
pub async fn delete_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(params): Query<DeleteProfileParams>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state
        .services
        .accounts
        .delete_profile(id, params.force.unwrap_or(false))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct DeleteProfileParams {
    pub force: Option<bool>,
}
