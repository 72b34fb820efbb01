use crate::{
    AppState,
    auth::{AuthUser, MaybeUser},
    error::ApiError,
    models::{
        self, AdminDashboardStats, Application, CreateApplicationRequest, CreateCategoryRequest,
        CreateJobRequest, CreateReviewRequest, DetailResponse, EmployerReview, Job, JobCategory,
        RegisterUserRequest, UpdateApplicationStatusRequest, UpdateJobRequest, User, UserProfile,
    },
    policy::{self, ApplicationScope},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// JobFilter
///
/// Accepted query parameters for the public job listing endpoint (GET /jobs).
/// Mirrors the filter surface of the catalog: category, salary band, free
/// text search, and pagination.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct JobFilter {
    pub category_id: Option<Uuid>,
    /// Lower salary bound (exclusive).
    pub salary_gt: Option<f64>,
    /// Upper salary bound (exclusive).
    pub salary_lt: Option<f64>,
    /// Full-text search over title, company, description and location.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// PageParams
///
/// Plain pagination window for the scoped listing endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn page_window(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

// --- Identity Handlers ---

/// register_user
///
/// [Public Route] Creates the local identity record with its immutable role.
/// Credential handling and token issuance belong to the external auth
/// subsystem; this endpoint records the profile and then *explicitly*
/// records the role-group membership in the same request, rather than
/// relying on a hidden post-save hook.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    // Fast path; the unique constraint on email remains the authority.
    if state.repo.get_user_by_email(&payload.email).await.is_some() {
        return Err(ApiError::Conflict(
            "A user with this email already exists.".to_string(),
        ));
    }

    let role = payload.role;
    let user = state
        .repo
        .create_user(payload)
        .await
        .ok_or_else(|| ApiError::Conflict("A user with this email already exists.".to_string()))?;

    // Synchronous group assignment inside the creation use case; ordering is
    // deterministic and visible right here.
    state.repo.add_user_to_role_group(user.id, role).await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// get_me
///
/// [Authenticated Route] Returns the caller's own profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        role: user.role,
        bio: user.bio,
        location: user.location,
    }))
}

// --- Job Catalog Handlers ---

/// get_jobs
///
/// [Public Route] Lists active postings with filtering, search and
/// pagination. The repository query applies `is_active = true`
/// unconditionally so hidden postings never leak to anonymous callers.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobFilter),
    responses((status = 200, description = "List filtered jobs", body = [Job]))
)]
pub async fn get_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Json<Vec<models::Job>> {
    let (limit, offset) = page_window(filter.limit, filter.offset);
    let jobs = state
        .repo
        .get_jobs(
            filter.category_id,
            filter.salary_gt,
            filter.salary_lt,
            filter.search,
            limit,
            offset,
        )
        .await;
    Json(jobs)
}

/// get_job_details
///
/// [Public Route] Retrieves a single posting by ID.
#[utoipa::path(
    get,
    path = "/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses((status = 200, description = "Found", body = Job))
)]
pub async fn get_job_details(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<models::Job>, ApiError> {
    match state.repo.get_job(job_id).await {
        Some(job) => Ok(Json(job)),
        None => Err(ApiError::NotFound("Job not found.".to_string())),
    }
}

/// create_job
///
/// [Authenticated Route] Posts a new job owned by the calling employer.
/// Admins may also create postings (assigned to themselves for moderation
/// purposes).
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Created", body = Job),
        (status = 403, description = "Not an employer")
    )
)]
pub async fn create_job(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    policy::ensure_job_author(&user)?;

    if let Some(category_id) = payload.category_id {
        if state.repo.get_category(category_id).await.is_none() {
            return Err(ApiError::Validation("Unknown job category.".to_string()));
        }
    }

    let job = state
        .repo
        .create_job(payload, user.id)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// update_job
///
/// [Authenticated Route] Partial update of a posting. Restricted to the
/// owning employer or an admin; a foreign employer receives 403, not 404,
/// since the record exists.
#[utoipa::path(
    put,
    path = "/jobs/{job_id}",
    request_body = UpdateJobRequest,
    responses((status = 200, description = "Updated", body = Job))
)]
pub async fn update_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let job = state
        .repo
        .get_job(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;
    policy::ensure_job_owner(&user, &job)?;

    state
        .repo
        .update_job(job_id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::Internal)
}

/// delete_job
///
/// [Authenticated Route] Deletes a posting, cascading its applications and
/// reviews. Owning employer or admin only.
#[utoipa::path(
    delete,
    path = "/jobs/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let job = state
        .repo
        .get_job(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;
    policy::ensure_job_owner(&user, &job)?;

    if state.repo.delete_job(job_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Internal)
    }
}

/// get_categories
///
/// [Public Route] Lists all job categories.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [JobCategory]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<JobCategory>> {
    Json(state.repo.get_categories().await)
}

/// get_category_details
///
/// [Public Route] Retrieves a single category by ID.
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses((status = 200, description = "Found", body = JobCategory))
)]
pub async fn get_category_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobCategory>, ApiError> {
    match state.repo.get_category(id).await {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound("Category not found.".to_string())),
    }
}

/// create_category
///
/// [Authenticated Route] Creates a category. Admins and employers only.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses((status = 201, description = "Created", body = JobCategory))
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<JobCategory>), ApiError> {
    policy::ensure_job_author(&user)?;
    let category = state
        .repo
        .create_category(payload)
        .await
        .ok_or(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(category)))
}

// --- Application Engine Handlers ---

/// list_applications
///
/// [Scoped Route] Un-nested application listing. The result set is scoped by
/// role: seekers see their own applications, employers see applications
/// against their jobs, admins see everything. Anonymous callers receive an
/// empty list, not an error — the fail-closed default.
#[utoipa::path(
    get,
    path = "/applications",
    params(PageParams),
    responses((status = 200, description = "Role-scoped applications", body = [Application]))
)]
pub async fn list_applications(
    MaybeUser(caller): MaybeUser,
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Json<Vec<Application>> {
    let scope = ApplicationScope::for_caller(caller.as_ref());
    let (limit, offset) = page_window(page.limit, page.offset);
    Json(
        state
            .repo
            .list_applications(scope, None, limit, offset)
            .await,
    )
}

/// list_job_applications
///
/// [Scoped Route] Same scoping as `list_applications`, restricted to one job.
#[utoipa::path(
    get,
    path = "/jobs/{job_id}/applications",
    params(("job_id" = Uuid, Path, description = "Job ID"), PageParams),
    responses((status = 200, description = "Role-scoped applications for the job", body = [Application]))
)]
pub async fn list_job_applications(
    MaybeUser(caller): MaybeUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> Json<Vec<Application>> {
    let scope = ApplicationScope::for_caller(caller.as_ref());
    let (limit, offset) = page_window(page.limit, page.offset);
    Json(
        state
            .repo
            .list_applications(scope, Some(job_id), limit, offset)
            .await,
    )
}

/// create_application
///
/// [Authenticated Route] A seeker applies to a job. The applicant and job
/// references are set server-side; the record always starts `pending`.
///
/// *Uniqueness*: the handler pre-checks the (job, applicant) pair as a fast
/// path, but the repository insert (`ON CONFLICT DO NOTHING` on the unique
/// index) is the authority, so two racing creates cannot both succeed.
#[utoipa::path(
    post,
    path = "/jobs/{job_id}/applications",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Created", body = Application),
        (status = 403, description = "Not a seeker"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Already applied")
    )
)]
pub async fn create_application(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), ApiError> {
    policy::ensure_seeker(&user)?;

    if state.repo.get_job(job_id).await.is_none() {
        return Err(ApiError::NotFound("Job not found.".to_string()));
    }

    if state.repo.find_application(job_id, user.id).await.is_some() {
        return Err(ApiError::Conflict(
            "You have already applied for this job.".to_string(),
        ));
    }

    // None here means we lost the race to a concurrent create; the unique
    // index already holds a row for the pair.
    let application = state
        .repo
        .create_application(job_id, user.id, payload)
        .await
        .ok_or_else(|| ApiError::Conflict("You have already applied for this job.".to_string()))?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// get_application_details
///
/// [Authenticated Route] Direct by-id read. Visible to the applicant, the
/// employer owning the job, and admins; anyone else gets 403 (the record
/// exists — this is an authorization failure, not a lookup miss).
#[utoipa::path(
    get,
    path = "/jobs/{job_id}/applications/{id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID"),
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Found", body = Application),
        (status = 403, description = "Not visible to caller")
    )
)]
pub async fn get_application_details(
    user: AuthUser,
    State(state): State<AppState>,
    Path((job_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .repo
        .get_application(id)
        .await
        .filter(|a| a.job_id == job_id)
        .ok_or_else(|| ApiError::NotFound("Application not found.".to_string()))?;
    let job = state
        .repo
        .get_job(application.job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;

    if !policy::can_view_application(&user, &application, &job) {
        return Err(ApiError::Forbidden(
            "You do not have permission to view this application.".to_string(),
        ));
    }
    Ok(Json(application))
}

/// update_application_status
///
/// [Authenticated Route] Employer/admin-driven status transition. Any target
/// status in the set is accepted; no forward-only ordering is imposed (see
/// DESIGN.md). A non-owning employer receives 403.
#[utoipa::path(
    patch,
    path = "/jobs/{job_id}/applications/{id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID"),
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Application),
        (status = 403, description = "Not the owning employer or admin")
    )
)]
pub async fn update_application_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path((job_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateApplicationStatusRequest>,
) -> Result<Json<Application>, ApiError> {
    let application = state
        .repo
        .get_application(id)
        .await
        .filter(|a| a.job_id == job_id)
        .ok_or_else(|| ApiError::NotFound("Application not found.".to_string()))?;
    let job = state
        .repo
        .get_job(application.job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;

    policy::ensure_status_writer(&user, &job)?;

    state
        .repo
        .update_application_status(id, payload.status)
        .await
        .map(Json)
        .ok_or(ApiError::Internal)
}

/// withdraw_application
///
/// [Authenticated Route] The one seeker-initiated transition. Fails with a
/// validation error naming the current status when the application is
/// already finalized.
///
/// *Concurrency*: the initial terminal check runs against the handler's
/// read, but the repository UPDATE re-validates the precondition against
/// committed state; if a concurrent acceptance wins the race, the update
/// affects zero rows and the freshly read status is reported instead.
#[utoipa::path(
    post,
    path = "/jobs/{job_id}/applications/{id}/withdraw",
    params(
        ("job_id" = Uuid, Path, description = "Job ID"),
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Withdrawn", body = DetailResponse),
        (status = 400, description = "Already finalized"),
        (status = 403, description = "Not the applicant")
    )
)]
pub async fn withdraw_application(
    user: AuthUser,
    State(state): State<AppState>,
    Path((job_id, id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DetailResponse>, ApiError> {
    let application = state
        .repo
        .get_application(id)
        .await
        .filter(|a| a.job_id == job_id)
        .ok_or_else(|| ApiError::NotFound("Application not found.".to_string()))?;

    policy::ensure_withdraw_owner(&user, &application)?;
    policy::ensure_withdrawable(application.status)?;

    if state.repo.withdraw_application(id, user.id).await.is_some() {
        return Ok(Json(DetailResponse {
            detail: "Application successfully withdrawn.".to_string(),
        }));
    }

    // The conditional update lost a race; classify against fresh state.
    match state.repo.get_application(id).await {
        Some(fresh) => {
            policy::ensure_withdrawable(fresh.status)?;
            Err(ApiError::Internal)
        }
        None => Err(ApiError::NotFound("Application not found.".to_string())),
    }
}

// --- Review Gate Handlers ---

/// get_job_reviews
///
/// [Public Route] Lists reviews left for a job's employer.
#[utoipa::path(
    get,
    path = "/jobs/{job_id}/reviews",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses((status = 200, description = "Reviews", body = [EmployerReview]))
)]
pub async fn get_job_reviews(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<EmployerReview>>, ApiError> {
    if state.repo.get_job(job_id).await.is_none() {
        return Err(ApiError::NotFound("Job not found.".to_string()));
    }
    Ok(Json(state.repo.get_job_reviews(job_id).await))
}

/// create_review
///
/// [Authenticated Route] The Review Gate. A seeker may review the employer
/// of a job only when they hold an `accepted` application for it; an
/// ineligible caller is rejected with 403 regardless of input shape. The
/// `employer` and `job_seeker` references come from the job and the session,
/// never from the payload.
#[utoipa::path(
    post,
    path = "/jobs/{job_id}/reviews",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Created", body = EmployerReview),
        (status = 403, description = "No accepted application"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn create_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<EmployerReview>), ApiError> {
    policy::ensure_review_author(&user)?;

    let job = state
        .repo
        .get_job(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Job not found.".to_string()))?;

    // Eligibility before input validation: an ineligible caller learns
    // nothing about what a well-formed review would have looked like.
    let eligible = state.repo.has_accepted_application(job_id, user.id).await;
    policy::ensure_review_eligible(eligible)?;

    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::Validation(
            "Rating must be an integer between 1 and 5.".to_string(),
        ));
    }

    let created = state
        .repo
        .create_review(
            job_id,
            job.employer_id,
            user.id,
            payload.rating,
            payload.comment.unwrap_or_default(),
        )
        .await;

    match created {
        Some(review) => Ok((StatusCode::CREATED, Json(review))),
        // The unique triple constraint fired; name the existing review.
        None => match state.repo.find_review(job_id, job.employer_id, user.id).await {
            Some(existing) => Err(ApiError::Conflict(format!(
                "You have already reviewed this job (review {}).",
                existing.id
            ))),
            None => Err(ApiError::Internal),
        },
    }
}

// --- Admin Handlers ---

/// get_admin_stats
///
/// [Admin Route] Core application counters for the dashboard.
///
/// *RBAC*: strict enforcement of the admin role before the repository call.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    policy::ensure_admin(&user)?;
    Ok(Json(state.repo.get_stats().await))
}

/// get_admin_users
///
/// [Admin Route] Full user listing for moderation.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_admin_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    policy::ensure_admin(&user)?;
    Ok(Json(state.repo.list_users().await))
}
