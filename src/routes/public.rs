use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client (anonymous or logged-in). These routes primarily handle read-only
/// catalog access and the registration gateway.
///
/// Security Mandate:
/// The job listing handler must enforce `is_active=true` at the Repository
/// level, and the two application listing routes derive a fail-closed
/// visibility scope from the *optional* caller identity: an anonymous
/// request yields an empty list rather than an error or a data leak.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates the local identity record with its immutable role and the
        // explicit role-group membership. Token issuance is external.
        .route("/register", post(handlers::register_user))
        // GET /jobs?category_id=...&salary_gt=...&search=...
        // Lists active postings with filtering, search and pagination.
        .route("/jobs", get(handlers::get_jobs))
        // GET /jobs/{job_id}
        // Retrieves the detailed view of a single posting.
        .route("/jobs/{job_id}", get(handlers::get_job_details))
        // GET /categories, GET /categories/{id}
        // Read-only category catalog.
        .route("/categories", get(handlers::get_categories))
        .route("/categories/{id}", get(handlers::get_category_details))
        // GET /jobs/{job_id}/reviews
        // Lists reviews left for the posting's employer.
        .route("/jobs/{job_id}/reviews", get(handlers::get_job_reviews))
        // GET /applications and GET /jobs/{job_id}/applications
        // Role-scoped listings via the infallible MaybeUser extractor:
        // seeker -> own rows, employer -> own jobs' rows, admin -> all,
        // anonymous -> empty (fail-closed).
        .route("/applications", get(handlers::list_applications))
        .route(
            "/jobs/{job_id}/applications",
            get(handlers::list_job_applications),
        )
}
