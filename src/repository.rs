use crate::models::{
    AdminDashboardStats, Application, ApplicationStatus, CreateApplicationRequest,
    CreateCategoryRequest, CreateJobRequest, EmployerReview, Job, JobCategory,
    RegisterUserRequest, Role, UpdateJobRequest, User,
};
use crate::policy::ApplicationScope;
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the
/// core of the Repository Abstraction pattern, allowing the handlers to
/// interact with the data layer without knowing the specific implementation
/// (Postgres, in-memory test double, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
///
/// Conflict-sensitive inserts return `Option`: `None` means the storage
/// layer's uniqueness constraint rejected the row (the constraint, not the
/// handler pre-check, is the authority under concurrent requests).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    // Returns None if the email is already registered.
    async fn create_user(&self, req: RegisterUserRequest) -> Option<User>;
    /// Records the role-group membership for a new identity. Called
    /// explicitly and synchronously by the registration handler; there is no
    /// hidden post-save hook.
    async fn add_user_to_role_group(&self, user_id: Uuid, role: Role) -> bool;
    async fn list_users(&self) -> Vec<User>;

    // --- Job Catalog ---
    async fn get_categories(&self) -> Vec<JobCategory>;
    async fn get_category(&self, id: Uuid) -> Option<JobCategory>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Option<JobCategory>;

    // Public listing with filtering. Must enforce is_active=true.
    async fn get_jobs(
        &self,
        category_id: Option<Uuid>,
        salary_gt: Option<f64>,
        salary_lt: Option<f64>,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Vec<Job>;
    // Retrieval by id regardless of active status; visibility decisions are
    // the caller's.
    async fn get_job(&self, id: Uuid) -> Option<Job>;
    async fn create_job(&self, req: CreateJobRequest, employer_id: Uuid) -> Option<Job>;
    // Ownership is checked by the handler against the fetched job; the
    // update itself targets the id only.
    async fn update_job(&self, id: Uuid, req: UpdateJobRequest) -> Option<Job>;
    // Deletion cascades applications and reviews at the schema level.
    async fn delete_job(&self, id: Uuid) -> bool;

    // --- Application Engine ---
    // Role-scoped listing. `ApplicationScope::None` must yield an empty
    // result set without touching the database.
    async fn list_applications(
        &self,
        scope: ApplicationScope,
        job_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Vec<Application>;
    async fn get_application(&self, id: Uuid) -> Option<Application>;
    // Fast-path duplicate pre-check for (job, applicant).
    async fn find_application(&self, job_id: Uuid, applicant_id: Uuid) -> Option<Application>;
    // Inserts in state `pending`; None signals the unique-pair constraint fired.
    async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
        req: CreateApplicationRequest,
    ) -> Option<Application>;
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application>;
    /// Conditional transition to `withdrawn`. The WHERE clause re-validates
    /// ownership and the non-terminal precondition against committed state,
    /// so a concurrent acceptance loses no data: the withdraw simply affects
    /// zero rows and the handler re-reads to classify the failure.
    async fn withdraw_application(&self, id: Uuid, applicant_id: Uuid) -> Option<Application>;

    // --- Review Gate ---
    async fn has_accepted_application(&self, job_id: Uuid, applicant_id: Uuid) -> bool;
    async fn get_job_reviews(&self, job_id: Uuid) -> Vec<EmployerReview>;
    async fn find_review(
        &self,
        job_id: Uuid,
        employer_id: Uuid,
        job_seeker_id: Uuid,
    ) -> Option<EmployerReview>;
    // None signals the unique (employer, job_seeker, job) constraint fired.
    async fn create_review(
        &self,
        job_id: Uuid,
        employer_id: Uuid,
        job_seeker_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Option<EmployerReview>;

    // --- Admin ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, role, bio, location, phone_number, created_at";
const JOB_COLUMNS: &str = "id, employer_id, title, company_name, description, requirements, \
     location, category_id, salary, employment_type, experience_level, remote_option, \
     is_featured, is_active, application_deadline, created_at, updated_at";
const APPLICATION_COLUMNS: &str =
    "id, job_id, applicant_id, cover_letter, resume, portfolio_link, status, applied_at";
const REVIEW_COLUMNS: &str =
    "id, job_id, employer_id, job_seeker_id, rating, comment, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- IDENTITY ---

    /// get_user
    ///
    /// Retrieves the identity record needed for authentication and
    /// authorization. Resolved on every authenticated request.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_email error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts the identity row. The unique constraint on `email` is the
    /// authority for duplicate registration; `None` signals it fired.
    async fn create_user(&self, req: RegisterUserRequest) -> Option<User> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, role, bio, location, phone_number, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             ON CONFLICT (email) DO NOTHING \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_id)
        .bind(&req.email)
        .bind(req.role.as_str())
        .bind(&req.bio)
        .bind(&req.location)
        .bind(&req.phone_number)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_user error: {:?}", e);
            None
        })
    }

    /// add_user_to_role_group
    ///
    /// Records the group membership matching the role. Idempotent via the
    /// composite primary key on `user_groups`.
    async fn add_user_to_role_group(&self, user_id: Uuid, role: Role) -> bool {
        let result = sqlx::query(
            "INSERT INTO user_groups (user_id, group_name) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role.group_name())
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_user_to_role_group error: {:?}", e);
                false
            }
        }
    }

    async fn list_users(&self) -> Vec<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_users error: {:?}", e);
            vec![]
        })
    }

    // --- JOB CATALOG ---

    async fn get_categories(&self) -> Vec<JobCategory> {
        sqlx::query_as::<_, JobCategory>(
            "SELECT id, name, description FROM job_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_categories error: {:?}", e);
            vec![]
        })
    }

    async fn get_category(&self, id: Uuid) -> Option<JobCategory> {
        sqlx::query_as::<_, JobCategory>(
            "SELECT id, name, description FROM job_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_category error: {:?}", e);
            None
        })
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Option<JobCategory> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, JobCategory>(
            "INSERT INTO job_categories (id, name, description) VALUES ($1, $2, $3) \
             RETURNING id, name, description",
        )
        .bind(new_id)
        .bind(&req.name)
        .bind(&req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_category error: {:?}", e);
            None
        })
    }

    /// get_jobs
    ///
    /// Implements flexible search/filtering using QueryBuilder for safe
    /// parameterization. **Security**: strictly enforces `is_active = true`
    /// in the base query; inactive postings never leak into the public
    /// listing.
    async fn get_jobs(
        &self,
        category_id: Option<Uuid>,
        salary_gt: Option<f64>,
        salary_lt: Option<f64>,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> Vec<Job> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE is_active = true "
        ));

        if let Some(c) = category_id {
            builder.push(" AND category_id = ");
            builder.push_bind(c);
        }

        if let Some(min) = salary_gt {
            builder.push(" AND salary > ");
            builder.push_bind(min);
        }

        if let Some(max) = salary_lt {
            builder.push(" AND salary < ");
            builder.push_bind(max);
        }

        if let Some(s) = search {
            // Case-insensitive search across title, company, description and location.
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR company_name ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR location ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let query = builder.build_query_as::<Job>();

        match query.fetch_all(&self.pool).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("get_jobs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_job(&self, id: Uuid) -> Option<Job> {
        sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_job error: {:?}", e);
                None
            })
    }

    /// create_job
    ///
    /// Inserts a new posting owned by `employer_id`. Employment attributes
    /// fall back to their canonical defaults when the payload omits them.
    async fn create_job(&self, req: CreateJobRequest, employer_id: Uuid) -> Option<Job> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (id, employer_id, title, company_name, description, requirements, \
             location, category_id, salary, employment_type, experience_level, remote_option, \
             is_featured, is_active, application_deadline, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, false, true, $13, NOW(), NOW()) \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(new_id)
        .bind(employer_id)
        .bind(&req.title)
        .bind(&req.company_name)
        .bind(&req.description)
        .bind(req.requirements.as_deref().unwrap_or(""))
        .bind(req.location.as_deref().unwrap_or(""))
        .bind(req.category_id)
        .bind(req.salary)
        .bind(req.employment_type.as_deref().unwrap_or("full_time"))
        .bind(req.experience_level.as_deref().unwrap_or("entry_level"))
        .bind(req.remote_option.as_deref().unwrap_or("on_site"))
        .bind(req.application_deadline)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_job error: {:?}", e);
            None
        })
    }

    /// update_job
    ///
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle
    /// `Option<T>` fields, only updating a column if the corresponding field
    /// in `req` is `Some`.
    async fn update_job(&self, id: Uuid, req: UpdateJobRequest) -> Option<Job> {
        sqlx::query_as::<_, Job>(&format!(
            "UPDATE jobs \
             SET title = COALESCE($2, title), \
                 company_name = COALESCE($3, company_name), \
                 description = COALESCE($4, description), \
                 requirements = COALESCE($5, requirements), \
                 location = COALESCE($6, location), \
                 salary = COALESCE($7, salary), \
                 is_active = COALESCE($8, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.company_name)
        .bind(&req.description)
        .bind(&req.requirements)
        .bind(&req.location)
        .bind(req.salary)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_job error: {:?}", e);
            None
        })
    }

    /// delete_job
    ///
    /// The schema's `ON DELETE CASCADE` removes the posting's applications
    /// and reviews in the same statement.
    async fn delete_job(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_job error: {:?}", e);
                false
            }
        }
    }

    // --- APPLICATION ENGINE ---

    /// list_applications
    ///
    /// Role-scoped listing. The scope predicate is part of the SQL itself so
    /// an out-of-scope row can never be materialized, mirroring how the
    /// public job listing bakes in `is_active = true`.
    async fn list_applications(
        &self,
        scope: ApplicationScope,
        job_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Vec<Application> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT a.id, a.job_id, a.applicant_id, a.cover_letter, a.resume, \
             a.portfolio_link, a.status, a.applied_at \
             FROM applications a JOIN jobs j ON a.job_id = j.id WHERE ",
        );

        match scope {
            ApplicationScope::All => {
                builder.push("true");
            }
            ApplicationScope::Applicant(user_id) => {
                builder.push("a.applicant_id = ");
                builder.push_bind(user_id);
            }
            ApplicationScope::JobOwner(user_id) => {
                builder.push("j.employer_id = ");
                builder.push_bind(user_id);
            }
            // Fail-closed: anonymous or unrecognized callers see nothing.
            ApplicationScope::None => return vec![],
        }

        if let Some(job) = job_id {
            builder.push(" AND a.job_id = ");
            builder.push_bind(job);
        }

        builder.push(" ORDER BY a.applied_at DESC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let query = builder.build_query_as::<Application>();

        match query.fetch_all(&self.pool).await {
            Ok(apps) => apps,
            Err(e) => {
                tracing::error!("list_applications error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_application(&self, id: Uuid) -> Option<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_application error: {:?}", e);
            None
        })
    }

    async fn find_application(&self, job_id: Uuid, applicant_id: Uuid) -> Option<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications \
             WHERE job_id = $1 AND applicant_id = $2"
        ))
        .bind(job_id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_application error: {:?}", e);
            None
        })
    }

    /// create_application
    ///
    /// Inserts in state `pending`. `ON CONFLICT DO NOTHING` against the
    /// unique (job_id, applicant_id) index makes the insert itself the
    /// authority on duplicates: two racing creates cannot both return a row.
    async fn create_application(
        &self,
        job_id: Uuid,
        applicant_id: Uuid,
        req: CreateApplicationRequest,
    ) -> Option<Application> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Application>(&format!(
            "INSERT INTO applications \
             (id, job_id, applicant_id, cover_letter, resume, portfolio_link, status, applied_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW()) \
             ON CONFLICT (job_id, applicant_id) DO NOTHING \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(new_id)
        .bind(job_id)
        .bind(applicant_id)
        .bind(&req.cover_letter)
        .bind(&req.resume)
        .bind(&req.portfolio_link)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_application error: {:?}", e);
            None
        })
    }

    /// update_application_status
    ///
    /// Employer/admin-driven transition. No ordering is imposed on the
    /// target status (see DESIGN.md); authorization happens in the handler.
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = $2 WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_application_status error: {:?}", e);
            None
        })
    }

    /// withdraw_application
    ///
    /// The WHERE clause re-validates ownership and the non-terminal
    /// precondition against committed state at the moment of the write, not
    /// against whatever the handler read earlier.
    async fn withdraw_application(&self, id: Uuid, applicant_id: Uuid) -> Option<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = 'withdrawn' \
             WHERE id = $1 AND applicant_id = $2 \
               AND status NOT IN ('accepted', 'rejected', 'withdrawn') \
             RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(id)
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("withdraw_application error: {:?}", e);
            None
        })
    }

    // --- REVIEW GATE ---

    /// has_accepted_application
    ///
    /// The eligibility query behind the review gate.
    async fn has_accepted_application(&self, job_id: Uuid, applicant_id: Uuid) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS( \
                SELECT 1 FROM applications \
                WHERE job_id = $1 AND applicant_id = $2 AND status = 'accepted')",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("has_accepted_application error: {:?}", e);
            false
        })
    }

    async fn get_job_reviews(&self, job_id: Uuid) -> Vec<EmployerReview> {
        sqlx::query_as::<_, EmployerReview>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE job_id = $1 ORDER BY created_at DESC"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_job_reviews error: {:?}", e);
            vec![]
        })
    }

    async fn find_review(
        &self,
        job_id: Uuid,
        employer_id: Uuid,
        job_seeker_id: Uuid,
    ) -> Option<EmployerReview> {
        sqlx::query_as::<_, EmployerReview>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE job_id = $1 AND employer_id = $2 AND job_seeker_id = $3"
        ))
        .bind(job_id)
        .bind(employer_id)
        .bind(job_seeker_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_review error: {:?}", e);
            None
        })
    }

    /// create_review
    ///
    /// Honors the unique (employer, job_seeker, job) constraint; `None`
    /// means a review for the triple already exists.
    async fn create_review(
        &self,
        job_id: Uuid,
        employer_id: Uuid,
        job_seeker_id: Uuid,
        rating: i32,
        comment: String,
    ) -> Option<EmployerReview> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, EmployerReview>(&format!(
            "INSERT INTO reviews \
             (id, job_id, employer_id, job_seeker_id, rating, comment, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             ON CONFLICT (employer_id, job_seeker_id, job_id) DO NOTHING \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(new_id)
        .bind(job_id)
        .bind(employer_id)
        .bind(job_seeker_id)
        .bind(rating)
        .bind(comment)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_review error: {:?}", e);
            None
        })
    }

    // --- ADMIN ---

    /// get_stats
    ///
    /// Compiles all counters for the administrative dashboard in one call.
    async fn get_stats(&self) -> AdminDashboardStats {
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_jobs = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_applications = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let pending_applications = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM applications WHERE status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await
        .unwrap_or(0);
        AdminDashboardStats {
            total_users,
            total_jobs,
            total_applications,
            pending_applications,
        }
    }
}
