use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. This module carries the write surface of the
/// system: catalog management for employers, the application lifecycle for
/// seekers, and the gated review creation.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor
/// middleware being present on the router layer above it, guaranteeing a
/// validated identity with a typed role. Fine-grained rules (ownership, the
/// review gate, admin overrides) are enforced per-handler through the
/// policy module.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile.
        .route("/me", get(handlers::get_me))
        // --- Job Catalog Management ---
        // POST /jobs
        // Submits a new posting. Employer/admin only; ownership is recorded
        // from the session.
        .route("/jobs", post(handlers::create_job))
        // PUT/DELETE /jobs/{job_id}
        // Modify or remove a posting. Owning employer or admin; deletion
        // cascades applications and reviews.
        .route(
            "/jobs/{job_id}",
            put(handlers::update_job).delete(handlers::delete_job),
        )
        // POST /categories
        // Creates a category (employer/admin).
        .route("/categories", post(handlers::create_category))
        // --- Application Lifecycle ---
        // POST /jobs/{job_id}/applications
        // Seeker applies to a job; record starts `pending`. The unique
        // (job, applicant) index makes duplicate submissions a 409.
        .route(
            "/jobs/{job_id}/applications",
            post(handlers::create_application),
        )
        // GET/PATCH /jobs/{job_id}/applications/{id}
        // Direct read (applicant, owning employer, admin) and the
        // employer/admin status transition.
        .route(
            "/jobs/{job_id}/applications/{id}",
            get(handlers::get_application_details).patch(handlers::update_application_status),
        )
        // POST /jobs/{job_id}/applications/{id}/withdraw
        // The one seeker-initiated transition; refused with 400 once the
        // application is finalized.
        .route(
            "/jobs/{job_id}/applications/{id}/withdraw",
            post(handlers::withdraw_application),
        )
        // --- Review Gate ---
        // POST /jobs/{job_id}/reviews
        // Gated on an accepted application for the same (job, seeker) pair.
        .route("/jobs/{job_id}/reviews", post(handlers::create_review))
}
