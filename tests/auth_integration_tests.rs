use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use talent_bridge::{
    AppState,
    auth::{AuthUser, Claims, MaybeUser},
    config::{AppConfig, Env},
    models::{
        AdminDashboardStats, Application, ApplicationStatus, CreateApplicationRequest,
        CreateCategoryRequest, CreateJobRequest, EmployerReview, Job, JobCategory,
        RegisterUserRequest, Role, UpdateJobRequest, User,
    },
    policy::ApplicationScope,
    repository::Repository,
};
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

// The extractor only ever calls get_user; everything else is a placeholder
// to satisfy the trait.
#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Option<User> {
        self.user_to_return.clone()
    }
    async fn get_user_by_email(&self, _email: &str) -> Option<User> {
        None
    }
    async fn create_user(&self, _req: RegisterUserRequest) -> Option<User> {
        None
    }
    async fn add_user_to_role_group(&self, _user_id: Uuid, _role: Role) -> bool {
        false
    }
    async fn list_users(&self) -> Vec<User> {
        vec![]
    }
    async fn get_categories(&self) -> Vec<JobCategory> {
        vec![]
    }
    async fn get_category(&self, _id: Uuid) -> Option<JobCategory> {
        None
    }
    async fn create_category(&self, _req: CreateCategoryRequest) -> Option<JobCategory> {
        None
    }
    async fn get_jobs(
        &self,
        _category_id: Option<Uuid>,
        _salary_gt: Option<f64>,
        _salary_lt: Option<f64>,
        _search: Option<String>,
        _limit: i64,
        _offset: i64,
    ) -> Vec<Job> {
        vec![]
    }
    async fn get_job(&self, _id: Uuid) -> Option<Job> {
        None
    }
    async fn create_job(&self, _req: CreateJobRequest, _employer_id: Uuid) -> Option<Job> {
        None
    }
    async fn update_job(&self, _id: Uuid, _req: UpdateJobRequest) -> Option<Job> {
        None
    }
    async fn delete_job(&self, _id: Uuid) -> bool {
        false
    }
    async fn list_applications(
        &self,
        _scope: ApplicationScope,
        _job_id: Option<Uuid>,
        _limit: i64,
        _offset: i64,
    ) -> Vec<Application> {
        vec![]
    }
    async fn get_application(&self, _id: Uuid) -> Option<Application> {
        None
    }
    async fn find_application(&self, _job_id: Uuid, _applicant_id: Uuid) -> Option<Application> {
        None
    }
    async fn create_application(
        &self,
        _job_id: Uuid,
        _applicant_id: Uuid,
        _req: CreateApplicationRequest,
    ) -> Option<Application> {
        None
    }
    async fn update_application_status(
        &self,
        _id: Uuid,
        _status: ApplicationStatus,
    ) -> Option<Application> {
        None
    }
    async fn withdraw_application(&self, _id: Uuid, _applicant_id: Uuid) -> Option<Application> {
        None
    }
    async fn has_accepted_application(&self, _job_id: Uuid, _applicant_id: Uuid) -> bool {
        false
    }
    async fn get_job_reviews(&self, _job_id: Uuid) -> Vec<EmployerReview> {
        vec![]
    }
    async fn find_review(
        &self,
        _job_id: Uuid,
        _employer_id: Uuid,
        _job_seeker_id: Uuid,
    ) -> Option<EmployerReview> {
        None
    }
    async fn create_review(
        &self,
        _job_id: Uuid,
        _employer_id: Uuid,
        _job_seeker_id: Uuid,
        _rating: i32,
        _comment: String,
    ) -> Option<EmployerReview> {
        None
    }
    async fn get_stats(&self) -> AdminDashboardStats {
        AdminDashboardStats::default()
    }
}

// --- Test Utilities ---

fn test_user(id: Uuid, role: Role) -> User {
    User {
        id,
        email: "seeker@example.com".to_string(),
        role,
        ..User::default()
    }
}

fn state_with_user(user: Option<User>, env: Env) -> AppState {
    AppState {
        repo: Arc::new(MockAuthRepo {
            user_to_return: user,
        }),
        config: AppConfig {
            env,
            ..AppConfig::default()
        },
    }
}

fn epoch_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn make_token(user_id: Uuid, secret: &str, exp_offset: i64) -> String {
    let now = epoch_secs();
    let claims = Claims {
        sub: user_id,
        exp: (now as i64 + exp_offset) as usize,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding")
}

async fn extract(state: &AppState, authorization: Option<String>) -> Result<AuthUser, StatusCode> {
    let mut builder = Request::builder().uri("/me");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = builder.body(()).unwrap();
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

// --- Tests ---

#[tokio::test]
async fn test_valid_token_resolves_identity_and_role() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Employer)), Env::Production);
    let token = make_token(user_id, &state.config.jwt_secret, 3600);

    let auth_user = extract(&state, Some(format!("Bearer {}", token)))
        .await
        .expect("extraction succeeds");

    assert_eq!(auth_user.id, user_id);
    assert_eq!(auth_user.role, Role::Employer);
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let state = state_with_user(None, Env::Production);

    let result = extract(&state, None).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Seeker)), Env::Production);
    // Expired an hour ago.
    let token = make_token(user_id, &state.config.jwt_secret, -3600);

    let result = extract(&state, Some(format!("Bearer {}", token))).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_signature_is_unauthorized() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Seeker)), Env::Production);
    let token = make_token(user_id, "a-completely-different-secret", 3600);

    let result = extract(&state, Some(format!("Bearer {}", token))).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_user_with_valid_token_is_unauthorized() {
    // The token is valid but the DB lookup returns no user: the account was
    // removed after issuance.
    let user_id = Uuid::new_v4();
    let state = state_with_user(None, Env::Production);
    let token = make_token(user_id, &state.config.jwt_secret, 3600);

    let result = extract(&state, Some(format!("Bearer {}", token))).await;

    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_header_resolves_known_user() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Admin)), Env::Local);

    let request = Request::builder()
        .uri("/admin/stats")
        .header("x-user-id", user_id.to_string())
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .expect("bypass resolves");

    assert_eq!(auth_user.id, user_id);
    assert_eq!(auth_user.role, Role::Admin);
}

#[tokio::test]
async fn test_bypass_header_ignored_in_production() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Admin)), Env::Production);

    let request = Request::builder()
        .uri("/admin/stats")
        .header("x-user-id", user_id.to_string())
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    // Without a bearer token the production path must reject.
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_maybe_user_degrades_to_none_instead_of_rejecting() {
    let state = state_with_user(None, Env::Production);

    let request = Request::builder().uri("/applications").body(()).unwrap();
    let (mut parts, _) = request.into_parts();
    let MaybeUser(caller) = MaybeUser::from_request_parts(&mut parts, &state)
        .await
        .expect("infallible");

    assert!(caller.is_none());
}

#[tokio::test]
async fn test_maybe_user_resolves_valid_sessions() {
    let user_id = Uuid::new_v4();
    let state = state_with_user(Some(test_user(user_id, Role::Seeker)), Env::Production);
    let token = make_token(user_id, &state.config.jwt_secret, 3600);

    let request = Request::builder()
        .uri("/applications")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    let MaybeUser(caller) = MaybeUser::from_request_parts(&mut parts, &state)
        .await
        .expect("infallible");

    assert_eq!(caller.map(|u| u.id), Some(user_id));
}
