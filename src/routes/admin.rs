use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the admin role.
/// These endpoints provide moderation oversight and statistical access.
///
/// Access Control:
/// This entire router is nested behind the authentication middleware; the
/// explicit admin role check happens inside each handler (via
/// `policy::ensure_admin`) before any repository access, so a
/// non-admin session receives 403 rather than a data leak.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters (users, jobs, applications, pending queue).
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users
        // Full user listing for moderation. Admin-only; there is no
        // self-service role change, so edits happen out of band.
        .route("/users", get(handlers::get_admin_users))
}
