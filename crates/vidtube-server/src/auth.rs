//! Authentication module: JWT token management, cookies and password hashing.
//!
//! Sessions use a pair of HS256 tokens. The short-lived access token
//! authenticates requests; the refresh token is stored on the user and
//! rotated every time a new pair is issued, so only the latest one is
//! accepted by `/users/refresh-token`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;
use vidtube_core::{ObjectId, parse_object_id};
use vidtube_store::UserDocument;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";
/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// User id as hex.
    pub sub: String,
    pub email: String,
    pub username: String,
    pub fullname: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration time (unix timestamp).
    pub exp: i64,
}

/// Refresh token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    /// User id as hex.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id so two tokens issued in the same second differ.
    pub jti: String,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> ApiResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str, what: &str) -> ApiResult<T> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected {what}");
        ApiError::Unauthorized(format!("Invalid {what}"))
    })
}

/// Create an access token for `user`.
pub fn create_access_token(user: &UserDocument, config: &ServerConfig) -> ApiResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::minutes(config.access_token_expiry_minutes);
    let claims = AccessClaims {
        sub: user.id.to_hex(),
        email: user.email.clone(),
        username: user.username.clone(),
        fullname: user.fullname.clone(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };
    sign(&claims, &config.access_token_secret)
}

/// Create a refresh token for `user_id`.
pub fn create_refresh_token(user_id: ObjectId, config: &ServerConfig) -> ApiResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::days(config.refresh_token_expiry_days);
    let claims = RefreshClaims {
        sub: user_id.to_hex(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    sign(&claims, &config.refresh_token_secret)
}

/// Validate an access token and return its claims.
pub fn validate_access_token(token: &str, config: &ServerConfig) -> ApiResult<AccessClaims> {
    verify(token, &config.access_token_secret, "access token")
}

/// Validate a refresh token and return its claims.
pub fn validate_refresh_token(token: &str, config: &ServerConfig) -> ApiResult<RefreshClaims> {
    verify(token, &config.refresh_token_secret, "refresh token")
}

/// Create a token pair for `user_id` and persist the refresh token.
///
/// Returns the user as loaded before the update together with the pair.
pub async fn issue_token_pair(
    state: &AppState,
    user_id: ObjectId,
) -> ApiResult<(UserDocument, TokenPair)> {
    let user = state.store().get_user(user_id).await?;
    let config = state.config();

    let access_token = create_access_token(&user, config)?;
    let refresh_token = create_refresh_token(user.id, config)?;
    state
        .store()
        .set_refresh_token(user.id, &refresh_token)
        .await?;

    Ok((
        user,
        TokenPair {
            access_token,
            refresh_token,
        },
    ))
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(password_hash.to_string())
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Reject passwords shorter than [`MIN_PASSWORD_LEN`].
pub fn check_password_strength(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ============================================================================
// Cookies
// ============================================================================

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Add both token cookies to `jar`.
pub fn set_auth_cookies(jar: CookieJar, tokens: &TokenPair, config: &ServerConfig) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        config.secure_cookies,
    ))
    .add(auth_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        config.secure_cookies,
    ))
}

/// Expire both token cookies.
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

/// Access token from the `accessToken` cookie, else from a Bearer header.
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

// ============================================================================
// Extractor
// ============================================================================

/// The logged-in user, loaded from the database.
///
/// The password hash and refresh token are cleared before the value reaches
/// a handler.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserDocument,
}

impl AuthenticatedUser {
    pub fn id(&self) -> ObjectId {
        self.user.id
    }

    /// Whether `owner` is this user.
    pub fn owns(&self, owner: ObjectId) -> bool {
        self.user.id == owner
    }

    /// Fail with 403 unless this user is `owner`.
    pub fn require_owner(&self, owner: ObjectId, action: &str) -> ApiResult<()> {
        if self.owns(owner) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "You are not allowed to {action}"
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

        let claims = validate_access_token(&token, state.config())?;
        let user_id = parse_object_id(&claims.sub, "user")
            .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

        let mut user = match state.store().get_user(user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(ApiError::Unauthorized("Invalid access token".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        user.password.clear();
        user.refresh_token = None;

        Ok(AuthenticatedUser { user })
    }
}
