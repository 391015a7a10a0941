//! Circulation (issue/return) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::issue::{IssueBook, IssueDetails, IssueQuery, ReturnBook, StudentLoans},
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Return response with updated issue details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub issue: IssueDetails,
}

/// List issue records with filters and pagination
#[utoipa::path(
    get,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status (all, active, returned)"),
        ("search" = Option<String>, Query, description = "Search by student name, ID number or book title"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Records per page (default: 15)")
    ),
    responses(
        (status = 200, description = "List of issue records", body = PaginatedResponse<IssueDetails>),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn list_issues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<IssueQuery>,
) -> AppResult<Json<PaginatedResponse<IssueDetails>>> {
    claims.require_staff()?;

    let (issues, total) = state.services.circulation.search(&query).await?;

    Ok(Json(PaginatedResponse {
        items: issues,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(15),
    }))
}

/// Issue a book to a student
#[utoipa::path(
    post,
    path = "/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = IssueBook,
    responses(
        (status = 201, description = "Book issued", body = IssueDetails),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Student or book not found"),
        (status = 422, description = "Not enough copies or loan limit reached")
    )
)]
pub async fn create_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<IssueBook>,
) -> AppResult<(StatusCode, Json<IssueDetails>)> {
    claims.require_staff()?;

    let issue = state.services.circulation.issue(request).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

/// Return copies against an issue record
#[utoipa::path(
    post,
    path = "/issues/{id}/return",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Issue record ID")
    ),
    request_body = ReturnBook,
    responses(
        (status = 200, description = "Copies returned", body = ReturnResponse),
        (status = 400, description = "Returning more than outstanding"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Issue record not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ReturnBook>,
) -> AppResult<Json<ReturnResponse>> {
    claims.require_staff()?;

    let issue = state.services.circulation.return_book(id, request).await?;

    Ok(Json(ReturnResponse {
        status: if issue.is_returned {
            "returned".to_string()
        } else {
            "partially_returned".to_string()
        },
        issue,
    }))
}

/// A student's loans with summary counters
#[utoipa::path(
    get,
    path = "/profiles/{id}/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Profile ID")
    ),
    responses(
        (status = 200, description = "Loan history and summary", body = StudentLoans),
        (status = 403, description = "Not the owner and not staff"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn student_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(profile_id): Path<i32>,
) -> AppResult<Json<StudentLoans>> {
    claims.require_self_or_staff(profile_id)?;

    let loans = state.services.circulation.student_loans(profile_id).await?;
    Ok(Json(loans))
}
