use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Represents the standard payload structure expected inside a JSON Web
/// Token (JWT). These claims are signed by the external auth subsystem's
/// secret and validated upon every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the user. This is the primary key used to
    /// fetch the user's details and role from the `users` table.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the JWT must not be
    /// accepted. Crucial for preventing replay attacks.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use this
/// struct to retrieve the caller's ID and typed role for every policy check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to users.id.
    pub id: Uuid,
    /// The user's role, resolved fresh from the database on every request so
    /// a stale token cannot outlive a deleted account.
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This cleanly separates
/// authentication (middleware/extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Accessing Repository and AppConfig from state.
/// 2. Local Bypass: Allowing development-time access via the 'x-user-id' header.
/// 3. Token Validation: Standard Bearer token extraction and JWT decoding.
/// 4. DB Lookup: Fetching the user's current role and existence.
///
/// Rejection: Returns StatusCode::UNAUTHORIZED (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for JWT secret and Env check).
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Local Development Bypass Check
        // If the application is running in Env::Local, we allow
        // authentication by providing a known, valid UUID in the 'x-user-id'
        // header. Guarded by the Env check.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        // The UUID must still map to an actual user row so
                        // roles are correctly loaded.
                        if let Some(user) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                role: user.role,
                            });
                        }
                    }
                }
            }
        }
        // If Env is Production, or if the bypass failed, execution falls
        // through to the standard JWT validation flow.

        // 3. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // 4. JWT Decoding Setup
        let secret = &config.jwt_secret;
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::default();

        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        // 5. Decode and Validate the Token
        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                match e.kind() {
                    // Token expired: the most common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => return Err(StatusCode::UNAUTHORIZED),
                    // Catch all other failure types (bad signature, malformed token, etc.).
                    _ => return Err(StatusCode::UNAUTHORIZED),
                }
            }
        };

        let user_id = token_data.claims.sub;

        // 6. Database Lookup (Final Verification)
        // Prevents access if the user was deleted after the token was issued,
        // and resolves the current role for the policy layer.
        let user = repo
            .get_user(user_id)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

/// MaybeUser
///
/// Infallible variant of the `AuthUser` extractor, backing the fail-closed
/// scoped listing endpoints: an anonymous or unresolvable caller yields
/// `MaybeUser(None)` and the policy layer degrades the result set to empty
/// instead of rejecting the request with 401.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .ok();
        Ok(MaybeUser(user))
    }
}
