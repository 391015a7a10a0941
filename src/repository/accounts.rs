//! Accounts and profiles repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::profile::{
        Account, Profile, ProfileQuery, ProfileRow, ProfileSummary, ProfileSummaryRow, Role,
    },
};

/// Fields needed to create a login account plus its profile in one step
#[derive(Debug)]
pub struct NewRegistration {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub phone_number: String,
    pub id_number: Option<String>,
    pub department: Option<String>,
}

#[derive(Clone)]
pub struct AccountsRepository {
    pool: Pool<Postgres>,
}

impl AccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get account by ID
    pub async fn get_account_by_id(&self, id: i32) -> AppResult<Account> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account with id {} not found", id)))
    }

    /// Get account by email (primary authentication method)
    pub async fn get_account_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Check if email already exists on an account or a profile
    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1))
                OR EXISTS(SELECT 1 FROM profiles WHERE LOWER(email) = LOWER($1))
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if a login name is taken
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Check if a student ID number is taken
    pub async fn id_number_exists(&self, id_number: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id_number = $1)")
                .bind(id_number)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create an inactive account and its pending profile in one transaction
    pub async fn create_registration(
        &self,
        reg: &NewRegistration,
    ) -> AppResult<(Account, Profile)> {
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, email, password, is_active, is_staff, is_superuser)
            VALUES ($1, $2, $3, FALSE, FALSE, FALSE)
            RETURNING *
            "#,
        )
        .bind(&reg.username)
        .bind(&reg.email)
        .bind(&reg.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile: Profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO profiles (account_id, role, name, email, phone_number, id_number, department, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(reg.role)
        .bind(&reg.name)
        .bind(&reg.email)
        .bind(&reg.phone_number)
        .bind(&reg.id_number)
        .bind(&reg.department)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        Ok((account, profile))
    }

    /// Get profile by ID
    pub async fn get_profile_by_id(&self, id: i32) -> AppResult<Profile> {
        let profile = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", id)))?;

        Ok(profile.into())
    }

    /// Get the profile attached to an account, if any
    pub async fn get_profile_by_account(&self, account_id: i32) -> AppResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(profile.map(Profile::from))
    }

    /// Search profiles with filters and pagination
    pub async fn search_profiles(
        &self,
        query: &ProfileQuery,
    ) -> AppResult<(Vec<ProfileSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("p.status = ${}", params.len()));
        }

        if let Some(role) = query.role {
            params.push(role.as_str().to_string());
            conditions.push(format!("p.role = ${}", params.len()));
        }

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(p.name) LIKE ${} OR LOWER(p.id_number) LIKE ${})",
                params.len(),
                params.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM profiles p {}", where_clause);

        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT p.id, p.name, p.email, p.role, p.status, p.id_number, p.department,
                   (SELECT COUNT(*) FROM issued_books i
                    WHERE i.profile_id = p.id AND i.is_returned = FALSE) as active_loans
            FROM profiles p
            {}
            ORDER BY p.created_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, ProfileSummaryRow>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let profiles = select_builder.fetch_all(&self.pool).await?;

        Ok((profiles.into_iter().map(ProfileSummary::from).collect(), total))
    }

    /// Approve a profile: set approval metadata, clear rejection fields
    /// and reactivate the login (librarians also become staff)
    pub async fn approve_profile(&self, profile_id: i32, approver_id: i32) -> AppResult<Profile> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let profile: Profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET status = 'approved',
                approved_by = $1,
                approval_date = $2,
                rejection_reason = '',
                rejection_date = NULL,
                updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(approver_id)
        .bind(now)
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", profile_id)))?
        .into();

        sqlx::query("UPDATE accounts SET is_active = TRUE, is_staff = is_staff OR $1 WHERE id = $2")
            .bind(profile.role == Role::Librarian)
            .bind(profile.account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(profile)
    }

    /// Reject a profile: set rejection metadata and keep the login inactive
    pub async fn reject_profile(
        &self,
        profile_id: i32,
        actor_id: i32,
        reason: &str,
    ) -> AppResult<Profile> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let profile: Profile = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET status = 'rejected',
                approved_by = $1,
                rejection_reason = $2,
                rejection_date = $3,
                approval_date = NULL,
                updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(actor_id)
        .bind(reason)
        .bind(now)
        .bind(profile_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile with id {} not found", profile_id)))?
        .into();

        sqlx::query("UPDATE accounts SET is_active = FALSE WHERE id = $1")
            .bind(profile.account_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(profile)
    }

    /// Delete the account behind a profile (cascade removes the profile
    /// and any issue records)
    pub async fn delete_profile_account(&self, profile_id: i32, force: bool) -> AppResult<()> {
        let profile = self.get_profile_by_id(profile_id).await?;

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM issued_books WHERE profile_id = $1 AND is_returned = FALSE",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await?;

        if active_loans > 0 && !force {
            return Err(AppError::BusinessRule(
                "Student has active loans. Use force=true to delete anyway.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(profile.account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List accounts rejected on or before the cutoff
    pub async fn rejected_accounts_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AppResult<Vec<(i32, String)>> {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            r#"
            SELECT a.id, a.username
            FROM accounts a
            JOIN profiles p ON p.account_id = a.id
            WHERE p.status = 'rejected' AND p.rejection_date <= $1
            ORDER BY p.rejection_date
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a single account by ID
    pub async fn delete_account(&self, account_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, account_id: i32) -> AppResult<()> {
        sqlx::query("UPDATE accounts SET last_login = NOW() WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Check whether any superuser account exists
    pub async fn superuser_exists(&self) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE is_superuser = TRUE)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create an active superuser account (bootstrap)
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (username, email, password, is_active, is_staff, is_superuser)
            VALUES ($1, $2, $3, TRUE, TRUE, TRUE)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(account)
    }

    /// Count profiles awaiting review
    pub async fn count_pending(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count approved students
    pub async fn count_approved_students(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM profiles WHERE role = 'student' AND status = 'approved'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
