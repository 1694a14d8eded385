use axum::{
    Json,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::{is_valid_email, password_errors, registration_errors};
use super::{ApiError, ApiResponse, AppState, MessageResponse, PageDto};
use crate::services::{AccountError, ActivationOutcome};

/// Session key holding the authenticated user's ID.
const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub full_name: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ResetLinkResponse {
    pub uid: String,
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetConfirmRequest {
    pub new_password: String,
    pub confirm_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gates the authenticated password-change route on a live session.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", user_id);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /register
pub async fn register_page() -> Json<ApiResponse<PageDto>> {
    Json(ApiResponse::success(PageDto {
        slug: "register",
        title: "Create an account",
    }))
}

/// POST /register
/// Creates a pending account and emails the activation link.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let full_name = payload.full_name.trim();
    let email = payload.email.trim();

    let mut errors = registration_errors(
        full_name,
        email,
        &payload.password,
        &payload.confirm_password,
    );

    // The uniqueness failure joins the accumulated form errors; on its own
    // it surfaces as a conflict. The service re-checks either way.
    if is_valid_email(email) && state.store().email_exists(email).await? {
        if errors.is_empty() {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
        errors.push("Email already exists".to_string());
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    state
        .account_service()
        .register(full_name, email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Registration successful please check your email to activate your account.",
    ))))
}

/// GET /activate/{uid}/{token}
/// Consumes an activation link from an email.
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Path((uid, token)): Path<(String, String)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    match state.account_service().activate(&uid, &token).await {
        Ok(ActivationOutcome::Activated) => Ok(Json(ApiResponse::success(MessageResponse::new(
            "Account activated successfully. You can now log in.",
        )))),
        Ok(ActivationOutcome::AlreadyActive) => Ok(Json(ApiResponse::success(
            MessageResponse::new("Account is already activated."),
        ))),
        Err(AccountError::InvalidLink) => Err(ApiError::BadLink(
            "Invalid activation link.".to_string(),
        )),
        Err(AccountError::InvalidToken) => Err(ApiError::BadLink(
            "Activation link is invalid or has expired.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// GET /login
pub async fn login_page() -> Json<ApiResponse<PageDto>> {
    Json(ApiResponse::success(PageDto {
        slug: "login",
        title: "Log in",
    }))
}

/// POST /login
/// Verifies credentials against active accounts and starts a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "Please provide both email and password.",
        ));
    }

    let user = state.account_service().login(email, &payload.password).await?;

    if let Err(e) = session.insert(SESSION_USER_KEY, user.id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::info!("User {} logged in", user.email);

    Ok(Json(ApiResponse::success(LoginResponse {
        email: user.email,
        full_name: user.full_name,
    })))
}

/// POST /logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /password-reset (requires authentication)
pub async fn password_reset_page() -> Json<ApiResponse<PageDto>> {
    Json(ApiResponse::success(PageDto {
        slug: "password-reset",
        title: "Change your password",
    }))
}

/// POST /password-reset (requires authentication)
/// Changes the password, then ends the session so the user logs in again.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = get_session_user_id(&session).await?;

    let mut errors = password_errors(&payload.new_password, &payload.confirm_password);
    if payload.new_password == payload.current_password {
        errors.push("New password must be different from current password".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    state
        .account_service()
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;

    // Forced re-login after a password change.
    let _ = session.flush().await;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully.",
    ))))
}

/// GET /forgot-password
pub async fn forgot_password_page() -> Json<ApiResponse<PageDto>> {
    Json(ApiResponse::success(PageDto {
        slug: "forgot-password",
        title: "Forgot your password?",
    }))
}

/// POST /forgot-password
/// Emails a reset link if the address names an account.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() {
        return Err(ApiError::validation("Email address is required."));
    }
    if !is_valid_email(email) {
        return Err(ApiError::validation("Please enter a valid email address."));
    }

    state.account_service().request_password_reset(email).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset link has been sent to your email.",
    ))))
}

/// GET /password-reset-confirm/{uid}/{token}
/// Validates the link before the caller shows the new-password form.
pub async fn reset_confirm_check(
    State(state): State<Arc<AppState>>,
    Path((uid, token)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ResetLinkResponse>>, ApiError> {
    match state.account_service().check_reset_link(&uid, &token).await {
        Ok(()) => Ok(Json(ApiResponse::success(ResetLinkResponse { uid, token }))),
        Err(AccountError::InvalidLink | AccountError::InvalidToken) => Err(ApiError::BadLink(
            "The reset link is invalid or has expired.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /password-reset-confirm/{uid}/{token}
/// Consumes the link and sets the new password.
pub async fn reset_confirm(
    State(state): State<Arc<AppState>>,
    Path((uid, token)): Path<(String, String)>,
    Json(payload): Json<ResetConfirmRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let errors = password_errors(&payload.new_password, &payload.confirm_password);
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    match state
        .account_service()
        .confirm_password_reset(&uid, &token, &payload.new_password)
        .await
    {
        Ok(()) => Ok(Json(ApiResponse::success(MessageResponse::new(
            "Password has been reset. You can now log in.",
        )))),
        Err(AccountError::InvalidLink | AccountError::InvalidToken) => Err(ApiError::BadLink(
            "The reset link is invalid or has expired.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Get the user ID from the session, returns error if not authenticated
async fn get_session_user_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
