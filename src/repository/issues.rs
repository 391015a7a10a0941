//! Issue (circulation) repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::issue::{IssueDetails, IssueDetailsRow, IssueQuery, IssueStatusFilter, IssuedBook},
};

/// Shared join used by every listing query
const DETAILS_SELECT: &str = r#"
    SELECT i.id, i.quantity, i.issue_date, i.return_date, i.is_returned,
           b.id as book_id, b.title as book_title, b.author as book_author, b.isbn as book_isbn,
           p.id as profile_id, p.name as student_name, p.id_number as student_id_number,
           p.department as student_department, p.status as student_status
    FROM issued_books i
    JOIN books b ON i.book_id = b.id
    JOIN profiles p ON i.profile_id = p.id
"#;

#[derive(Clone)]
pub struct IssuesRepository {
    pool: Pool<Postgres>,
}

impl IssuesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get issue record by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<IssuedBook> {
        sqlx::query_as::<_, IssuedBook>("SELECT * FROM issued_books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", id)))
    }

    /// Get issue record with book and student details
    pub async fn get_details(&self, id: i32) -> AppResult<IssueDetails> {
        let row = sqlx::query_as::<_, IssueDetailsRow>(&format!("{} WHERE i.id = $1", DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", id)))?;

        Ok(row.into())
    }

    /// Issue copies of a book to a student.
    ///
    /// Runs in one transaction: the loan-limit check and the stock
    /// decrement are guarded so concurrent requests cannot drive the
    /// book quantity negative or exceed the per-student limit.
    pub async fn create(
        &self,
        profile_id: i32,
        book_id: i32,
        quantity: i32,
        max_active_loans: i64,
    ) -> AppResult<IssueDetails> {
        let mut tx = self.pool.begin().await?;

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issued_books WHERE profile_id = $1 AND is_returned = FALSE",
        )
        .bind(profile_id)
        .fetch_one(&mut *tx)
        .await?;

        if active_loans >= max_active_loans {
            return Err(AppError::BusinessRule(format!(
                "Maximum active loans reached ({}/{})",
                active_loans, max_active_loans
            )));
        }

        // Guarded decrement: zero rows affected means the book is missing
        // or does not have enough copies left
        let result = sqlx::query(
            "UPDATE books SET quantity = quantity - $1, updated_at = NOW() WHERE id = $2 AND quantity >= $1",
        )
        .bind(quantity)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i32> =
                sqlx::query_scalar("SELECT quantity FROM books WHERE id = $1")
                    .bind(book_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return match available {
                None => Err(AppError::NotFound(format!(
                    "Book with id {} not found",
                    book_id
                ))),
                Some(available) => Err(AppError::BusinessRule(format!(
                    "Not enough copies available ({} left)",
                    available
                ))),
            };
        }

        let issue_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO issued_books (profile_id, book_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(profile_id)
        .bind(book_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_details(issue_id).await
    }

    /// Return copies against an issue record.
    ///
    /// `quantity` defaults to everything outstanding. Stock is restored
    /// in the same transaction; when the outstanding count reaches zero
    /// the record flips to returned and gets its return date.
    pub async fn return_copies(
        &self,
        issue_id: i32,
        quantity: Option<i32>,
    ) -> AppResult<IssueDetails> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, IssuedBook>(
            "SELECT * FROM issued_books WHERE id = $1 FOR UPDATE",
        )
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue record with id {} not found", issue_id)))?;

        if record.is_returned {
            return Err(AppError::BusinessRule(
                "This book has already been returned".to_string(),
            ));
        }

        let outstanding = record.quantity;
        let returned = quantity.unwrap_or(outstanding);

        if returned > outstanding {
            return Err(AppError::Validation(format!(
                "Cannot return more than {} copies",
                outstanding
            )));
        }

        let remaining = outstanding - returned;
        let fully_returned = remaining == 0;
        let return_date = fully_returned.then(|| Utc::now().date_naive());

        sqlx::query(
            r#"
            UPDATE issued_books
            SET quantity = $1, is_returned = $2, return_date = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(remaining)
        .bind(fully_returned)
        .bind(return_date)
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET quantity = quantity + $1, updated_at = NOW() WHERE id = $2")
            .bind(returned)
            .bind(record.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_details(issue_id).await
    }

    /// Search issue records with filters and pagination
    pub async fn search(&self, query: &IssueQuery) -> AppResult<(Vec<IssueDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(15).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        match query.status {
            Some(IssueStatusFilter::Active) => conditions.push("i.is_returned = FALSE".to_string()),
            Some(IssueStatusFilter::Returned) => conditions.push("i.is_returned = TRUE".to_string()),
            _ => {}
        }

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(p.name) LIKE ${} OR LOWER(p.id_number) LIKE ${} OR LOWER(b.title) LIKE ${})",
                params.len(),
                params.len(),
                params.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!(
            r#"
            SELECT COUNT(*)
            FROM issued_books i
            JOIN books b ON i.book_id = b.id
            JOIN profiles p ON i.profile_id = p.id
            {}
            "#,
            where_clause
        );

        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY i.issue_date DESC, i.id DESC LIMIT {} OFFSET {}",
            DETAILS_SELECT, where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, IssueDetailsRow>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let rows = select_builder.fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(IssueDetails::from).collect(), total))
    }

    /// All issue records for a student, newest first
    pub async fn list_for_profile(&self, profile_id: i32) -> AppResult<Vec<IssueDetails>> {
        let rows = sqlx::query_as::<_, IssueDetailsRow>(&format!(
            "{} WHERE i.profile_id = $1 ORDER BY i.issue_date DESC, i.id DESC",
            DETAILS_SELECT
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(IssueDetails::from).collect())
    }

    /// Count a student's open issue records
    pub async fn count_active_for_profile(&self, profile_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issued_books WHERE profile_id = $1 AND is_returned = FALSE",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Count all open issue records
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issued_books WHERE is_returned = FALSE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count completed issue records
    pub async fn count_returned(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM issued_books WHERE is_returned = TRUE")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
