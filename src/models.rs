use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Role & Status Enumerations ---

/// Role
///
/// The RBAC field assigned at registration and immutable thereafter (there is
/// no role-change endpoint). Every capability check in the policy layer
/// matches on this enumeration; an unparseable database value fails the row
/// decode instead of silently granting access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Employer,
    #[default]
    Seeker,
}

#[derive(Debug, Error)]
#[error("unknown role '{0}'")]
pub struct ParseRoleError(String);

impl Role {
    /// The canonical database/wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Seeker => "seeker",
        }
    }

    /// Display name of the membership group recorded at registration.
    pub fn group_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Employer => "Employer",
            Role::Seeker => "Job Seeker",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "seeker" => Ok(Role::Seeker),
            _ => Err(ParseRoleError(value)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ApplicationStatus
///
/// The application lifecycle: `pending` (initial) -> `reviewed` ->
/// `interviewed` -> `offered`, closing in one of the terminal states
/// `accepted`, `rejected` or `withdrawn`. Terminal applications admit no
/// withdrawal; see `is_terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Interviewed,
    Offered,
    Accepted,
    Rejected,
    Withdrawn,
}

#[derive(Debug, Error)]
#[error("unknown application status '{0}'")]
pub struct ParseStatusError(String);

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "offered" => Ok(ApplicationStatus::Offered),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            _ => Err(ParseStatusError(value)),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table. The role column is
/// stored as text and decoded through `TryFrom<String>` so an unexpected
/// value surfaces as a decode error rather than an unchecked string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// JobCategory
///
/// Publicly readable grouping for postings. Deleting a category nulls the
/// `category_id` of its jobs (schema `ON DELETE SET NULL`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct JobCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Job
///
/// A posting owned by exactly one employer (`employer_id`, cascade-delete
/// with the owner). Employment attributes are carried as their canonical
/// string spellings (`full_time`, `entry_level`, `on_site`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    pub id: Uuid,
    // FK to users.id (Owner).
    pub employer_id: Uuid,
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub category_id: Option<Uuid>,
    pub salary: Option<f64>,
    pub employment_type: String,
    pub experience_level: String,
    pub remote_option: String,
    pub is_featured: bool,
    // Inactive postings are hidden from the public listing but stay
    // reachable by id for their owner and existing applicants.
    pub is_active: bool,
    #[ts(type = "string")]
    pub application_deadline: Option<NaiveDate>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Application
///
/// A seeker's request to be considered for a job. At most one row exists per
/// (job, applicant) pair; the unique index on `(job_id, applicant_id)` is
/// the authority, the handler pre-check is only a fast path. `resume` is an
/// opaque storage key managed by the external media service.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub cover_letter: String,
    pub resume: String,
    pub portfolio_link: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// EmployerReview
///
/// A seeker's review of an employer for a specific job, creatable only
/// behind the review gate (an accepted application must exist). Unique per
/// (employer, job_seeker, job) triple via a database constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct EmployerReview {
    pub id: Uuid,
    pub job_id: Uuid,
    pub employer_id: Uuid,
    pub job_seeker_id: Uuid,
    // Integer in [1,5], validated before insert.
    pub rating: i32,
    pub comment: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input for the public registration endpoint (POST /register). Credential
/// handling and token issuance live in the external auth subsystem; this
/// service only records the profile row and its role-group membership.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// CreateJobRequest
///
/// Input payload for posting a new job (POST /jobs). Employment attributes
/// default to the most common values when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateJobRequest {
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub category_id: Option<Uuid>,
    pub salary: Option<f64>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub remote_option: Option<String>,
    #[ts(type = "string")]
    pub application_deadline: Option<NaiveDate>,
}

/// UpdateJobRequest
///
/// Partial update payload for PUT /jobs/{id}. Uses `Option<T>` per field so
/// only the provided columns are touched (COALESCE at the query level).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateCategoryRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

/// CreateApplicationRequest
///
/// Input payload for applying to a job (POST /jobs/{job_id}/applications).
/// The applicant and job references are set server-side from the session and
/// the URL; only the free-form fields are trusted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateApplicationRequest {
    pub cover_letter: String,
    // Storage key produced by the external media upload flow.
    pub resume: String,
    pub portfolio_link: Option<String>,
}

/// UpdateApplicationStatusRequest
///
/// Body of PATCH /jobs/{job_id}/applications/{id}. Deserialization rejects
/// anything outside the status set before the handler runs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateApplicationStatusRequest {
    pub status: ApplicationStatus,
}

/// CreateReviewRequest
///
/// Input for the gated review endpoint (POST /jobs/{job_id}/reviews).
/// `employer` and `job_seeker` are never accepted from the caller; they are
/// derived from the job and the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

// --- Output Schemas ---

/// DetailResponse
///
/// Generic human-readable outcome message, e.g. the withdraw confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DetailResponse {
    pub detail: String,
}

/// AdminDashboardStats
///
/// Counters for the administrative dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_jobs: i64,
    pub total_applications: i64,
    /// Applications still awaiting an employer decision (`pending`).
    pub pending_applications: i64,
}

/// UserProfile
///
/// Output schema for the authenticated user's own profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub bio: Option<String>,
    pub location: Option<String>,
}
