use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser; // The resolved authenticated user identity.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for
/// the application. It aggregates all API paths and data schemas that have
/// been decorated with the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]`
/// macros. The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::register_user, handlers::get_me,
        handlers::get_jobs, handlers::get_job_details, handlers::create_job,
        handlers::update_job, handlers::delete_job,
        handlers::get_categories, handlers::get_category_details, handlers::create_category,
        handlers::list_applications, handlers::list_job_applications,
        handlers::create_application, handlers::get_application_details,
        handlers::update_application_status, handlers::withdraw_application,
        handlers::get_job_reviews, handlers::create_review,
        handlers::get_admin_stats, handlers::get_admin_users
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Role, models::ApplicationStatus,
            models::User, models::UserProfile, models::RegisterUserRequest,
            models::JobCategory, models::CreateCategoryRequest,
            models::Job, models::CreateJobRequest, models::UpdateJobRequest,
            models::Application, models::CreateApplicationRequest,
            models::UpdateApplicationStatusRequest,
            models::EmployerReview, models::CreateReviewRequest,
            models::DetailResponse, models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "talent-bridge", description = "Talent Bridge Job Board API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe,
/// and immutable container holding all essential application services and
/// configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow extractors to selectively pull components from
// the shared AppState (notably the AuthUser extractor, which needs the
// repository for the role lookup and the config for the JWT secret).

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// A middleware function that enforces authentication for the
/// `authenticated_routes`.
///
/// *Mechanism*: It attempts to extract `AuthUser` from the request. Since
/// `AuthUser` implements `FromRequestParts`, if authentication (JWT
/// validation, DB lookup) fails, the extractor immediately rejects the
/// request with a 401 Unauthorized status, preventing execution of the
/// handler. If successful, it allows the request to proceed.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied. The scoped application
        // listings live here and derive their own fail-closed visibility.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        // This implements the first layer of Defense-in-Depth for these routes.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: Nested under '/admin', behind the same auth layer;
        // the admin role check is performed *inside* the handlers.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in
                // a tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: returns the x-request-id header
                // to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span
/// creation. It extracts the `x-request-id` header (if present) and includes
/// it in the structured logging metadata alongside the HTTP method and URI,
/// so every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
