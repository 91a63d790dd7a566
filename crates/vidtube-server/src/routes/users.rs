//! User account routes: registration, sessions, profile and history.

use axum::{
    Router,
    body::Bytes,
    extract::{Multipart, State},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use vidtube_core::{
    MediaAsset, ResourceType, normalize_email, normalize_username, parse_object_id,
    require_non_blank,
};
use vidtube_media::UploadedMedia;
use vidtube_store::NewUser;

use crate::auth::{
    ACCESS_COOKIE, AuthenticatedUser, REFRESH_COOKIE, TokenPair, check_password_strength,
    clear_auth_cookies, hash_password, issue_token_pair, set_auth_cookies,
    validate_access_token, validate_refresh_token, verify_password,
};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ValidatedJson, ValidatedMultipart, ValidatedPath};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::upload::{FormSpec, UploadForm, discard_uploads, release_asset, upload_spooled};
use crate::views::{ChannelProfileView, UserView, VideoSummaryView};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response for login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
}

/// Optional request body for refresh-token.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Request body for change-password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Request body for update-account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
}

const REGISTER_FORM: FormSpec = FormSpec {
    text_fields: &["fullname", "email", "username", "password"],
    file_fields: &["avatar", "coverImage"],
};

const AVATAR_FORM: FormSpec = FormSpec {
    text_fields: &[],
    file_fields: &["avatar"],
};

const COVER_FORM: FormSpec = FormSpec {
    text_fields: &[],
    file_fields: &["coverImage"],
};

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/users/register - Create an account.
async fn register(
    State(state): State<AppState>,
    ValidatedMultipart(multipart): ValidatedMultipart,
) -> ApiResult<ApiResponse<UserView>> {
    let mut form = UploadForm::read(
        multipart,
        REGISTER_FORM,
        state.config().upload_tmp_dir.as_ref(),
    )
    .await?;

    let fields = ["fullname", "email", "username", "password"]
        .map(|name| form.text(name).map(str::trim).filter(|v| !v.is_empty()));
    let [Some(fullname), Some(email), Some(username), Some(password)] = fields else {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    };
    let fullname = fullname.to_string();
    let email = normalize_email(email)?;
    let username = normalize_username(username)?;
    check_password_strength(password)?;

    if state
        .store()
        .find_user_by_username_or_email(&username, &email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }
    let password_hash = hash_password(password)?;

    let avatar_file = form.require_file("avatar")?;
    let cover_file = form.take_file("coverImage");

    let media = state.media();
    let mut uploaded: Vec<UploadedMedia> = Vec::new();

    let avatar = upload_spooled(media, &avatar_file, ResourceType::Image).await?;
    uploaded.push(avatar.clone());

    let cover_image = match &cover_file {
        Some(file) => match upload_spooled(media, file, ResourceType::Image).await {
            Ok(cover) => {
                uploaded.push(cover.clone());
                Some(cover.asset())
            }
            Err(e) => {
                discard_uploads(media, &uploaded).await;
                return Err(e);
            }
        },
        None => None,
    };

    let new_user = NewUser {
        username,
        email,
        fullname,
        avatar: avatar.asset(),
        cover_image,
        password_hash,
    };

    let user = match state.store().insert_user(new_user).await {
        Ok(user) => user,
        Err(e) => {
            discard_uploads(media, &uploaded).await;
            return Err(match e {
                vidtube_store::StoreError::Duplicate(_) => {
                    ApiError::Conflict("User already exists".to_string())
                }
                other => other.into(),
            });
        }
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(ApiResponse::created(
        UserView::from(&user),
        "User registered successfully",
    ))
}

/// POST /api/v1/users/login - Start a session.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, ApiResponse<LoginResponse>)> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if validate_access_token(cookie.value(), state.config()).is_ok() {
            return Err(ApiError::BadRequest(
                "A user is already logged in; log out first".to_string(),
            ));
        }
    }

    let email = normalize_email(require_non_blank(req.email.as_deref(), "email")?)?;
    let username = match req.username.as_deref().map(str::trim) {
        Some(u) if !u.is_empty() => Some(normalize_username(u)?),
        _ => None,
    };
    let password = require_non_blank(req.password.as_deref(), "password")?;

    let user = state
        .store()
        .find_user_for_login(&email, username.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(password, &user.password)? {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Unauthorized("Invalid user credentials".to_string()));
    }

    let (user, tokens) = issue_token_pair(&state, user.id).await?;
    let jar = set_auth_cookies(jar, &tokens, state.config());

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: UserView::from(&user),
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// POST /api/v1/users/logout - End the session.
async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<Empty>)> {
    state.store().clear_refresh_token(auth.id()).await?;
    tracing::info!(user_id = %auth.id(), "User logged out");
    Ok((
        clear_auth_cookies(jar),
        ApiResponse::ok(Empty {}, "User logged out successfully"),
    ))
}

/// POST /api/v1/users/refresh-token - Rotate the token pair.
///
/// The refresh token is read from the cookie, else from the JSON body.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<(CookieJar, ApiResponse<TokenPair>)> {
    let from_body = || -> Option<String> {
        if body.is_empty() {
            return None;
        }
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|r| r.refresh_token)
    };
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.trim().is_empty())
        .or_else(from_body)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = validate_refresh_token(&incoming, state.config())?;
    let user_id = parse_object_id(&claims.sub, "user")
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = match state.store().get_user(user_id).await {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".to_string(),
        ));
    }

    let (_, tokens) = issue_token_pair(&state, user.id).await?;
    let jar = set_auth_cookies(jar, &tokens, state.config());

    tracing::debug!(user_id = %user.id, "Rotated refresh token");

    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

/// POST /api/v1/users/change-password
async fn change_password(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<Empty>> {
    let old_password = require_non_blank(req.old_password.as_deref(), "oldPassword")?;
    let new_password = require_non_blank(req.new_password.as_deref(), "newPassword")?;

    // The extractor strips the hash, so load it again.
    let user = state.store().get_user(auth.id()).await?;
    if !verify_password(old_password, &user.password)? {
        return Err(ApiError::Unauthorized("Old password is incorrect".to_string()));
    }
    check_password_strength(new_password)?;

    let hash = hash_password(new_password)?;
    state.store().update_password(user.id, &hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::ok(Empty {}, "Password changed successfully"))
}

/// GET /api/v1/users/current-user
async fn current_user(auth: AuthenticatedUser) -> ApiResponse<UserView> {
    ApiResponse::ok(UserView::from(&auth.user), "Current user details")
}

/// GET /api/v1/users/c/{username} - Public channel profile.
async fn channel_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedPath(username): ValidatedPath<String>,
) -> ApiResult<ApiResponse<ChannelProfileView>> {
    let username = require_non_blank(Some(username.as_str()), "username")?;

    let profile = state
        .store()
        .channel_profile(username, Some(auth.id()))
        .await?
        .ok_or_else(|| ApiError::NotFound("Channel not found".to_string()))?;

    Ok(ApiResponse::ok(
        ChannelProfileView::from(profile),
        "User channel fetched successfully",
    ))
}

/// PATCH /api/v1/users/update-account
async fn update_account(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<ApiResponse<UserView>> {
    let (Some(fullname), Some(email)) = (
        req.fullname.as_deref().map(str::trim).filter(|v| !v.is_empty()),
        req.email.as_deref().map(str::trim).filter(|v| !v.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Fullname and email are required".to_string(),
        ));
    };
    let email = normalize_email(email)?;

    if state.store().email_taken_by_other(&email, auth.id()).await? {
        return Err(ApiError::Conflict("Email is already in use".to_string()));
    }

    let user = state
        .store()
        .update_account(auth.id(), fullname, &email)
        .await?;

    Ok(ApiResponse::ok(
        UserView::from(&user),
        "Account details updated successfully",
    ))
}

/// Upload one image field and hand the asset to `apply`.
///
/// The new asset is discarded if `apply` fails.
async fn replace_image<F, Fut>(
    state: &AppState,
    multipart: Multipart,
    spec: FormSpec,
    field: &str,
    apply: F,
) -> ApiResult<vidtube_store::UserDocument>
where
    F: FnOnce(MediaAsset) -> Fut,
    Fut: std::future::Future<Output = vidtube_store::StoreResult<vidtube_store::UserDocument>>,
{
    let mut form = UploadForm::read(multipart, spec, state.config().upload_tmp_dir.as_ref()).await?;
    let file = form.require_file(field)?;

    let uploaded = upload_spooled(state.media(), &file, ResourceType::Image).await?;
    match apply(uploaded.asset()).await {
        Ok(user) => Ok(user),
        Err(e) => {
            discard_uploads(state.media(), std::slice::from_ref(&uploaded)).await;
            Err(e.into())
        }
    }
}

/// PATCH /api/v1/users/avatar
async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedMultipart(multipart): ValidatedMultipart,
) -> ApiResult<ApiResponse<UserView>> {
    let previous = auth.user.avatar.clone();
    let user_id = auth.id();
    let store = state.store();
    let user = replace_image(&state, multipart, AVATAR_FORM, "avatar", |asset| async move {
        store.update_avatar(user_id, &asset).await
    })
    .await?;

    if previous.public_id != user.avatar.public_id {
        release_asset(state.media(), &previous, ResourceType::Image).await;
    }
    tracing::info!(user_id = %user.id, "Avatar updated");

    Ok(ApiResponse::ok(
        UserView::from(&user),
        "Avatar updated successfully",
    ))
}

/// PATCH /api/v1/users/cover-image
async fn update_cover_image(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedMultipart(multipart): ValidatedMultipart,
) -> ApiResult<ApiResponse<UserView>> {
    let previous = auth.user.cover_image.clone();
    let user_id = auth.id();
    let store = state.store();
    let user = replace_image(&state, multipart, COVER_FORM, "coverImage", |asset| async move {
        store.update_cover_image(user_id, &asset).await
    })
    .await?;

    if let Some(previous) = previous {
        let replaced = user
            .cover_image
            .as_ref()
            .is_some_and(|current| current.public_id != previous.public_id);
        if replaced {
            release_asset(state.media(), &previous, ResourceType::Image).await;
        }
    }
    tracing::info!(user_id = %user.id, "Cover image updated");

    Ok(ApiResponse::ok(
        UserView::from(&user),
        "Cover image updated successfully",
    ))
}

/// GET /api/v1/users/history - Watch history, most recent first.
async fn watch_history(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<ApiResponse<Vec<VideoSummaryView>>> {
    let videos = state.store().watch_history(auth.id()).await?;
    Ok(ApiResponse::ok(
        videos.into_iter().map(VideoSummaryView::from).collect(),
        "Watch history fetched successfully",
    ))
}

/// Build user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/c/{username}", get(channel_profile))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/history", get(watch_history))
}
