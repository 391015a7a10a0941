//! Circulation (issue/return) service

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::issue::{
        IssueBook, IssueDetails, IssueQuery, LoanSummary, ReturnBook, StudentLoans,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Issue copies of a book to an approved student
    pub async fn issue(&self, req: IssueBook) -> AppResult<IssueDetails> {
        use validator::Validate;
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let profile = self
            .repository
            .accounts
            .get_profile_by_id(req.profile_id)
            .await?;

        if !profile.is_student() {
            return Err(AppError::Validation(
                "Books can only be issued to students".to_string(),
            ));
        }
        if !profile.is_approved() {
            return Err(AppError::BusinessRule(
                "Student registration is awaiting approval".to_string(),
            ));
        }

        let quantity = req.quantity.unwrap_or(1);

        let details = self
            .repository
            .issues
            .create(
                req.profile_id,
                req.book_id,
                quantity,
                self.config.max_active_loans,
            )
            .await?;

        tracing::info!(
            "Issued {} cop{} of book {} to profile {}",
            quantity,
            if quantity == 1 { "y" } else { "ies" },
            req.book_id,
            req.profile_id
        );

        Ok(details)
    }

    /// Return copies against an issue record
    pub async fn return_book(&self, issue_id: i32, req: ReturnBook) -> AppResult<IssueDetails> {
        use validator::Validate;
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let details = self
            .repository
            .issues
            .return_copies(issue_id, req.quantity)
            .await?;

        tracing::info!("Return recorded against issue {}", issue_id);

        Ok(details)
    }

    /// Search issue records
    pub async fn search(&self, query: &IssueQuery) -> AppResult<(Vec<IssueDetails>, i64)> {
        self.repository.issues.search(query).await
    }

    /// A student's loan history plus summary counters
    pub async fn student_loans(&self, profile_id: i32) -> AppResult<StudentLoans> {
        // Verify the profile exists
        self.repository.accounts.get_profile_by_id(profile_id).await?;

        let records = self.repository.issues.list_for_profile(profile_id).await?;
        let active_count = records.iter().filter(|r| !r.is_returned).count() as i64;
        let returned_count = records.iter().filter(|r| r.is_returned).count() as i64;

        Ok(StudentLoans {
            summary: LoanSummary {
                active_count,
                total_count: records.len() as i64,
                returned_count,
                max_active_loans: self.config.max_active_loans,
                can_borrow_more: active_count < self.config.max_active_loans,
            },
            records,
        })
    }

    /// Count all open issue records
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.issues.count_active().await
    }

    /// Count completed issue records
    pub async fn count_returned(&self) -> AppResult<i64> {
        self.repository.issues.count_returned().await
    }
}
