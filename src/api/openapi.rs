//! OpenAPI documentation

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, issues, profiles, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carrel API",
        version = "0.3.0",
        description = "Campus library management and registration approval REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Profiles
        profiles::list_profiles,
        profiles::get_profile,
        profiles::approve_profile,
        profiles::reject_profile,
        profiles::delete_profile,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Issues
        issues::list_issues,
        issues::create_issue,
        issues::return_issue,
        issues::student_loans,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::AccountInfo,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MeResponse,
            // Profiles
            crate::models::profile::Profile,
            crate::models::profile::ProfileSummary,
            crate::models::profile::ProfileQuery,
            crate::models::profile::RegisterRequest,
            crate::models::profile::RejectRequest,
            crate::models::profile::Role,
            crate::models::profile::ApprovalStatus,
            crate::models::profile::Department,
            // Books
            crate::models::book::Book,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Issues
            crate::models::issue::IssuedBook,
            crate::models::issue::IssueDetails,
            crate::models::issue::BookRef,
            crate::models::issue::StudentRef,
            crate::models::issue::IssueQuery,
            crate::models::issue::IssueBook,
            crate::models::issue::ReturnBook,
            crate::models::issue::LoanSummary,
            crate::models::issue::StudentLoans,
            issues::ReturnResponse,
            // Stats
            crate::services::stats::LibraryStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and authentication"),
        (name = "profiles", description = "Profile management and approval workflow"),
        (name = "books", description = "Book catalog management"),
        (name = "issues", description = "Circulation (issue/return) tracking"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
