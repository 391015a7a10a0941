//! Registration, authentication and approval-workflow service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};

use crate::{
    config::{AdminConfig, AuthConfig, CleanupConfig},
    error::{AppError, AppResult},
    models::profile::{
        Account, ApprovalStatus, Claims, Profile, ProfileQuery, ProfileSummary, RegisterRequest,
        Role,
    },
    repository::{accounts::NewRegistration, Repository},
};

/// Password rules carried over from the registration form:
/// not entirely numeric, and at least one digit.
pub(crate) fn check_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

/// The local part of an email address, used as the base login name
pub(crate) fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    auth_config: AuthConfig,
    cleanup_config: CleanupConfig,
}

impl AccountsService {
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        cleanup_config: CleanupConfig,
    ) -> Self {
        Self {
            repository,
            auth_config,
            cleanup_config,
        }
    }

    /// Register a new student or librarian.
    ///
    /// The login account is created inactive and the profile pending;
    /// both stay unusable until an administrator approves the profile.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<(Account, Profile)> {
        use validator::Validate;
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if req.password != req.password_confirm {
            return Err(AppError::Validation(
                "Passwords do not match. Please try again.".to_string(),
            ));
        }
        check_password_strength(&req.password)
            .map_err(|msg| AppError::Validation(msg.to_string()))?;

        match req.role {
            Role::Student => {
                if req.id_number.as_deref().map_or(true, str::is_empty) {
                    return Err(AppError::Validation(
                        "ID number is required for students".to_string(),
                    ));
                }
                if req.department.is_none() {
                    return Err(AppError::Validation(
                        "Department is required for students".to_string(),
                    ));
                }
            }
            Role::Librarian => {
                if req.id_number.is_some() || req.department.is_some() {
                    return Err(AppError::Validation(
                        "ID number and department only apply to students".to_string(),
                    ));
                }
            }
        }

        if self.repository.accounts.email_exists(&req.email).await? {
            return Err(AppError::Conflict(
                "Email already registered. Please use another.".to_string(),
            ));
        }

        if let Some(ref id_number) = req.id_number {
            if self.repository.accounts.id_number_exists(id_number).await? {
                return Err(AppError::Conflict(
                    "ID Number already registered. Please contact admin if this is an error."
                        .to_string(),
                ));
            }
        }

        let username = self.derive_username(&req.email).await?;
        let password_hash = self.hash_password(&req.password)?;

        let registration = NewRegistration {
            username,
            email: req.email,
            password_hash,
            role: req.role,
            name: req.name,
            phone_number: req.phone_number,
            id_number: req.id_number,
            department: req.department.map(|d| d.as_str().to_string()),
        };

        let (account, profile) = self
            .repository
            .accounts
            .create_registration(&registration)
            .await?;

        tracing::info!(
            "Registered {} account '{}' (profile {}), awaiting approval",
            profile.role,
            account.username,
            profile.id
        );

        Ok((account, profile))
    }

    /// Derive a unique login name from the email local part, appending a
    /// numeric suffix on collision
    async fn derive_username(&self, email: &str) -> AppResult<String> {
        let base = email_local_part(email);
        let mut username = base.to_string();
        let mut counter = 1;

        while self.repository.accounts.username_exists(&username).await? {
            username = format!("{}{}", base, counter);
            counter += 1;
        }

        Ok(username)
    }

    /// Authenticate by email and password, enforcing the approval gate.
    ///
    /// Superuser and staff accounts bypass the approval check. Returns
    /// the JWT, the account and its profile (if one exists).
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> AppResult<(String, Account, Option<Profile>)> {
        let account = self
            .repository
            .accounts
            .get_account_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&account, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let profile = self
            .repository
            .accounts
            .get_profile_by_account(account.id)
            .await?;

        // Superusers and staff bypass the approval workflow
        if !(account.is_superuser || account.is_staff) {
            let profile = profile.as_ref().ok_or_else(|| {
                AppError::Authentication(
                    "Your account is not properly configured. Please contact the administrator."
                        .to_string(),
                )
            })?;

            match profile.status {
                ApprovalStatus::Pending => {
                    return Err(AppError::Authentication(format!(
                        "Your {} registration is still pending approval",
                        profile.role
                    )));
                }
                ApprovalStatus::Rejected => {
                    let reason = if profile.rejection_reason.is_empty() {
                        "Not specified"
                    } else {
                        profile.rejection_reason.as_str()
                    };
                    return Err(AppError::Authentication(format!(
                        "Your registration has been rejected. Reason: {}",
                        reason
                    )));
                }
                ApprovalStatus::Approved => {
                    if !account.is_active {
                        return Err(AppError::Authentication(
                            "Your account has been deactivated. Please contact the administrator."
                                .to_string(),
                        ));
                    }
                }
            }
        }

        self.repository
            .accounts
            .touch_last_login(account.id)
            .await?;

        let token = self.create_token(&account, profile.as_ref(), remember_me)?;

        Ok((token, account, profile))
    }

    /// Create a JWT for an account. `remember_me` extends the lifetime
    /// from the session expiry to the long expiry.
    pub fn create_token(
        &self,
        account: &Account,
        profile: Option<&Profile>,
        remember_me: bool,
    ) -> AppResult<String> {
        let hours = if remember_me {
            self.auth_config.jwt_expiration_hours
        } else {
            self.auth_config.session_expiration_hours
        };

        let now = Utc::now().timestamp();
        let exp = now + (hours as i64 * 3600);

        let claims = Claims {
            sub: account.username.clone(),
            account_id: account.id,
            profile_id: profile.map(|p| p.id),
            role: profile.map(|p| p.role),
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.auth_config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Get account and profile for authenticated claims
    pub async fn current_user(&self, claims: &Claims) -> AppResult<(Account, Option<Profile>)> {
        let account = self
            .repository
            .accounts
            .get_account_by_id(claims.account_id)
            .await?;
        let profile = self
            .repository
            .accounts
            .get_profile_by_account(account.id)
            .await?;
        Ok((account, profile))
    }

    /// Get a profile by ID
    pub async fn get_profile(&self, id: i32) -> AppResult<Profile> {
        self.repository.accounts.get_profile_by_id(id).await
    }

    /// Search profiles
    pub async fn search_profiles(
        &self,
        query: &ProfileQuery,
    ) -> AppResult<(Vec<ProfileSummary>, i64)> {
        self.repository.accounts.search_profiles(query).await
    }

    /// Approve a pending profile and reactivate its login
    pub async fn approve(&self, profile_id: i32, approver_id: i32) -> AppResult<Profile> {
        let profile = self.repository.accounts.get_profile_by_id(profile_id).await?;

        if !profile.is_pending() {
            return Err(AppError::Conflict(
                "This profile has already been processed".to_string(),
            ));
        }

        let approved = self
            .repository
            .accounts
            .approve_profile(profile_id, approver_id)
            .await?;

        tracing::info!(
            "Profile {} ({}) approved by account {}",
            approved.id,
            approved.role,
            approver_id
        );

        Ok(approved)
    }

    /// Reject a pending profile. The login stays inactive and the purge
    /// job removes the account after the retention window.
    pub async fn reject(
        &self,
        profile_id: i32,
        actor_id: i32,
        reason: Option<String>,
    ) -> AppResult<Profile> {
        let profile = self.repository.accounts.get_profile_by_id(profile_id).await?;

        if !profile.is_pending() {
            return Err(AppError::Conflict(
                "This profile has already been processed".to_string(),
            ));
        }

        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "No reason provided".to_string());

        let rejected = self
            .repository
            .accounts
            .reject_profile(profile_id, actor_id, &reason)
            .await?;

        tracing::info!(
            "Profile {} rejected by account {} (reason: {})",
            rejected.id,
            actor_id,
            reason
        );

        Ok(rejected)
    }

    /// Delete a profile and its underlying account
    pub async fn delete_profile(&self, profile_id: i32, force: bool) -> AppResult<()> {
        self.repository
            .accounts
            .delete_profile_account(profile_id, force)
            .await
    }

    /// Delete accounts whose profile was rejected longer ago than the
    /// configured retention window. Returns the number deleted.
    pub async fn purge_rejected(&self) -> AppResult<usize> {
        let cutoff = Utc::now() - Duration::hours(self.cleanup_config.rejected_retention_hours);
        let stale = self
            .repository
            .accounts
            .rejected_accounts_before(cutoff)
            .await?;

        let mut deleted = 0;
        for (account_id, username) in stale {
            match self.repository.accounts.delete_account(account_id).await {
                Ok(()) => {
                    deleted += 1;
                    tracing::info!("Deleted rejected account: {}", username);
                }
                Err(e) => {
                    tracing::error!("Error deleting account {}: {}", username, e);
                }
            }
        }

        Ok(deleted)
    }

    /// Create the bootstrap superuser on first start, if none exists
    pub async fn ensure_bootstrap_admin(&self, admin: &AdminConfig) -> AppResult<()> {
        if self.repository.accounts.superuser_exists().await? {
            return Ok(());
        }

        let username = self.derive_username(&admin.email).await?;
        let password_hash = self.hash_password(&admin.password)?;

        let account = self
            .repository
            .accounts
            .create_superuser(&username, &admin.email, &password_hash)
            .await?;

        tracing::info!("Created bootstrap superuser '{}'", account.username);

        Ok(())
    }

    /// Verify an account password
    fn verify_password(&self, account: &Account, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&account.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_strength_rejects_numeric_only() {
        assert!(check_password_strength("12345678").is_err());
    }

    #[test]
    fn password_strength_requires_a_digit() {
        assert!(check_password_strength("abcdefgh").is_err());
        assert!(check_password_strength("abcdefg1").is_ok());
    }

    #[test]
    fn local_part_extraction() {
        assert_eq!(email_local_part("jane.doe@example.edu"), "jane.doe");
        assert_eq!(email_local_part("no-at-sign"), "no-at-sign");
    }
}
