//! Issue (loan) record model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::profile::{ApprovalStatus, Department};

/// Issue record from database.
/// `quantity` is the number of copies still outstanding; it decreases as
/// partial returns come in and the record flips to returned at zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssuedBook {
    pub id: i32,
    pub profile_id: i32,
    pub book_id: i32,
    pub quantity: i32,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row structure for issue list queries
#[derive(Debug, Clone, FromRow)]
pub struct IssueDetailsRow {
    pub id: i32,
    pub quantity: i32,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub book_isbn: String,
    pub profile_id: i32,
    pub student_name: String,
    pub student_id_number: Option<String>,
    pub student_department: Option<String>,
    pub student_status: String,
}

impl From<IssueDetailsRow> for IssueDetails {
    fn from(row: IssueDetailsRow) -> Self {
        IssueDetails {
            id: row.id,
            quantity: row.quantity,
            issue_date: row.issue_date,
            return_date: row.return_date,
            is_returned: row.is_returned,
            book: BookRef {
                id: row.book_id,
                title: row.book_title,
                author: row.book_author,
                isbn: row.book_isbn,
            },
            student: StudentRef {
                profile_id: row.profile_id,
                name: row.student_name,
                id_number: row.student_id_number,
                department: row.student_department.and_then(|d| d.parse().ok()),
                status: row
                    .student_status
                    .parse()
                    .unwrap_or(ApprovalStatus::Pending),
            },
        }
    }
}

/// Issue record with book and student details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueDetails {
    pub id: i32,
    pub quantity: i32,
    pub issue_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_returned: bool,
    pub book: BookRef,
    pub student: StudentRef,
}

/// Book reference embedded in issue listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookRef {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Student reference embedded in issue listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentRef {
    pub profile_id: i32,
    pub name: String,
    pub id_number: Option<String>,
    pub department: Option<Department>,
    pub status: ApprovalStatus,
}

/// Status filter for issue listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatusFilter {
    All,
    Active,
    Returned,
}

/// Issue list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct IssueQuery {
    /// Filter by status (all, active, returned)
    pub status: Option<IssueStatusFilter>,
    /// Search by student name, ID number or book title
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Issue book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IssueBook {
    pub profile_id: i32,
    pub book_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

/// Return book request; omitting quantity returns everything outstanding
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnBook {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

/// Per-student loan summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanSummary {
    pub active_count: i64,
    pub total_count: i64,
    pub returned_count: i64,
    pub max_active_loans: i64,
    pub can_borrow_more: bool,
}

/// Student loans response: summary plus full history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentLoans {
    pub summary: LoanSummary,
    pub records: Vec<IssueDetails>,
}
