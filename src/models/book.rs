//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Accepts ISBN-13 (13 digits) or legacy ISBN-10 (9 digits + digit/X),
/// hyphens stripped before matching.
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{13}|\d{9}[\dXx])$").expect("invalid ISBN regex"));

/// Validate an ISBN string the way the catalog stores it
pub fn is_valid_isbn(isbn: &str) -> bool {
    let normalized: String = isbn.chars().filter(|c| *c != '-').collect();
    ISBN_RE.is_match(&normalized)
}

/// Strip hyphens for storage and uniqueness comparison
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-').collect()
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Copies currently available for issuing
    pub quantity: i32,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Availability filter for book listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityFilter {
    All,
    Available,
    Unavailable,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Substring search over title, author and ISBN
    pub search: Option<String>,
    /// Availability filter (all, available, unavailable)
    pub status: Option<AvailabilityFilter>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 or 13 characters"))]
    pub isbn: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub cover_image: Option<String>,
}

/// Update book request (partial)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Author cannot be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 or 13 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub cover_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_13_accepted() {
        assert!(is_valid_isbn("9780307474278"));
        assert!(is_valid_isbn("978-0-307-47427-8"));
    }

    #[test]
    fn isbn_10_accepted() {
        assert!(is_valid_isbn("0307474275"));
        assert!(is_valid_isbn("030747427X"));
        assert!(is_valid_isbn("0-307-47427-5"));
    }

    #[test]
    fn malformed_isbn_rejected() {
        assert!(!is_valid_isbn(""));
        assert!(!is_valid_isbn("abc"));
        assert!(!is_valid_isbn("97803074742789"));
        assert!(!is_valid_isbn("03074742X5"));
    }

    #[test]
    fn normalize_strips_hyphens_only() {
        assert_eq!(normalize_isbn("978-0-307-47427-8"), "9780307474278");
        assert_eq!(normalize_isbn("030747427X"), "030747427X");
    }
}
