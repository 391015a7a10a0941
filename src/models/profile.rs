//! Account, profile and approval-workflow models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Librarian,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Librarian => "librarian",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "librarian" => Ok(Role::Librarian),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Approval workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(format!("Invalid approval status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ApprovalStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ApprovalStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ApprovalStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Academic departments (students only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Department {
    #[serde(rename = "CSE")]
    Cse,
    #[serde(rename = "EEE")]
    Eee,
    #[serde(rename = "ICT")]
    Ict,
    #[serde(rename = "Robotics")]
    Robotics,
    #[serde(rename = "Cyber_Security")]
    CyberSecurity,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Cse => "CSE",
            Department::Eee => "EEE",
            Department::Ict => "ICT",
            Department::Robotics => "Robotics",
            Department::CyberSecurity => "Cyber_Security",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CSE" => Ok(Department::Cse),
            "EEE" => Ok(Department::Eee),
            "ICT" => Ok(Department::Ict),
            "Robotics" => Ok(Department::Robotics),
            "Cyber_Security" => Ok(Department::CyberSecurity),
            _ => Err(format!("Invalid department: {}", s)),
        }
    }
}

/// Login account backing a profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Internal row structure for profile queries (with String enum fields)
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    id: i32,
    account_id: i32,
    role: String,
    name: String,
    email: String,
    phone_number: String,
    id_number: Option<String>,
    department: Option<String>,
    status: String,
    approved_by: Option<i32>,
    approval_date: Option<DateTime<Utc>>,
    rejection_reason: String,
    rejection_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            account_id: row.account_id,
            role: row.role.parse().unwrap_or(Role::Student),
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            id_number: row.id_number,
            department: row.department.and_then(|d| d.parse().ok()),
            status: row.status.parse().unwrap_or(ApprovalStatus::Pending),
            approved_by: row.approved_by,
            approval_date: row.approval_date,
            rejection_reason: row.rejection_reason,
            rejection_date: row.rejection_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Per-account profile carrying role and approval state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: i32,
    pub account_id: i32,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Required for students, absent for librarians
    pub id_number: Option<String>,
    /// Required for students, absent for librarians
    pub department: Option<Department>,
    pub status: ApprovalStatus,
    pub approved_by: Option<i32>,
    pub approval_date: Option<DateTime<Utc>>,
    pub rejection_reason: String,
    pub rejection_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApprovalStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.status == ApprovalStatus::Rejected
    }

    /// Approved students may borrow books
    pub fn can_borrow(&self) -> bool {
        self.is_student() && self.is_approved()
    }
}

/// Internal row structure for profile list queries
#[derive(Debug, Clone, FromRow)]
pub struct ProfileSummaryRow {
    id: i32,
    name: String,
    email: String,
    role: String,
    status: String,
    id_number: Option<String>,
    department: Option<String>,
    active_loans: Option<i64>,
}

impl From<ProfileSummaryRow> for ProfileSummary {
    fn from(row: ProfileSummaryRow) -> Self {
        ProfileSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role.parse().unwrap_or(Role::Student),
            status: row.status.parse().unwrap_or(ApprovalStatus::Pending),
            id_number: row.id_number,
            department: row.department.and_then(|d| d.parse().ok()),
            active_loans: row.active_loans.unwrap_or(0),
        }
    }
}

/// Short profile representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: ApprovalStatus,
    pub id_number: Option<String>,
    pub department: Option<Department>,
    pub active_loans: i64,
}

/// Profile list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ProfileQuery {
    /// Filter by approval status
    pub status: Option<ApprovalStatus>,
    /// Filter by role
    pub role: Option<Role>,
    /// Search by name or ID number
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Registration request for both roles
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    pub role: Role,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 20, message = "Phone number is required"))]
    pub phone_number: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    pub password_confirm: String,
    /// Required when role is student
    #[validate(length(max = 20, message = "ID number must be at most 20 characters"))]
    pub id_number: Option<String>,
    /// Required when role is student
    pub department: Option<Department>,
}

/// Rejection request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

/// JWT Claims for authenticated accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub account_id: i32,
    /// Absent for superuser accounts created outside registration
    pub profile_id: Option<i32>,
    pub role: Option<Role>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff || self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian privileges required".to_string(),
            ))
        }
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }

    /// Allow staff, or the owner of the given profile
    pub fn require_self_or_staff(&self, profile_id: i32) -> Result<(), AppError> {
        if self.is_staff || self.is_superuser || self.profile_id == Some(profile_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You may only access your own records".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_and_status_round_trip() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("Librarian".parse::<Role>().unwrap(), Role::Librarian);
        assert!("admin".parse::<Role>().is_err());

        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
    }

    #[test]
    fn department_parsing_is_exact() {
        assert_eq!("CSE".parse::<Department>().unwrap(), Department::Cse);
        assert_eq!(
            "Cyber_Security".parse::<Department>().unwrap(),
            Department::CyberSecurity
        );
        // The legacy data uses exact codes; lowercase is not accepted
        assert!("cse".parse::<Department>().is_err());
    }

    #[test]
    fn claims_token_round_trip() {
        let claims = Claims {
            sub: "jdoe".to_string(),
            account_id: 7,
            profile_id: Some(3),
            role: Some(Role::Student),
            is_staff: false,
            is_superuser: false,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };

        let token = claims.create_token("test-secret").unwrap();
        let parsed = Claims::from_token(&token, "test-secret").unwrap();
        assert_eq!(parsed.sub, "jdoe");
        assert_eq!(parsed.profile_id, Some(3));
        assert_eq!(parsed.role, Some(Role::Student));

        assert!(Claims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn staff_guards() {
        let mut claims = Claims {
            sub: "x".to_string(),
            account_id: 1,
            profile_id: Some(9),
            role: Some(Role::Student),
            is_staff: false,
            is_superuser: false,
            exp: 0,
            iat: 0,
        };

        assert!(claims.require_staff().is_err());
        assert!(claims.require_self_or_staff(9).is_ok());
        assert!(claims.require_self_or_staff(10).is_err());

        claims.is_staff = true;
        assert!(claims.require_staff().is_ok());
        assert!(claims.require_superuser().is_err());

        claims.is_superuser = true;
        assert!(claims.require_superuser().is_ok());
    }
}
