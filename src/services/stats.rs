//! Library statistics service

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

/// Librarian dashboard counters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LibraryStats {
    pub total_books: i64,
    pub available_books: i64,
    pub unavailable_books: i64,
    pub total_students: i64,
    pub active_loans: i64,
    pub returned_loans: i64,
    pub pending_approvals: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Gather the overview counters in one pass
    pub async fn overview(&self) -> AppResult<LibraryStats> {
        Ok(LibraryStats {
            total_books: self.repository.books.count_total().await?,
            available_books: self.repository.books.count_available().await?,
            unavailable_books: self.repository.books.count_unavailable().await?,
            total_students: self.repository.accounts.count_approved_students().await?,
            active_loans: self.repository.issues.count_active().await?,
            returned_loans: self.repository.issues.count_returned().await?,
            pending_approvals: self.repository.accounts.count_pending().await?,
        })
    }
}
