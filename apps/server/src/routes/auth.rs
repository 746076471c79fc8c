//! # Auth Routes
//!
//! ```text
//! POST /api/auth/login            { email, password }  → Set-Cookie: session
//! POST /api/auth/register         { documentNumber, fullName, email, password }
//! GET  /api/auth/me               session user
//! POST /api/auth/logout           clears the cookie
//! POST /api/auth/forgot-password  { email }            → always 200
//! POST /api/auth/reset-password   { token, password }
//! ```
//!
//! No mail is sent. The reset link is written to the log at INFO.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use nailed_core::{Role, User, UserInput};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub document_number: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// The public part of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            role: user.role,
        }
    }
}

impl From<CurrentUser> for SessionUser {
    fn from(user: CurrentUser) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: SessionUser,
    /// Same value as the cookie, for clients using `Authorization: Bearer`.
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = state
        .db
        .users()
        .authenticate(&request.email, &request.password)
        .await?
        .ok_or_else(|| {
            warn!("Rejected login");
            ApiError::unauthorized("Invalid credentials")
        })?;

    if !user.status {
        warn!(user_id = %user.id, "Login by disabled user");
        return Err(ApiError::forbidden(
            "User is inactive. Contact an administrator.",
        ));
    }

    let token = state.sessions.issue(&user)?;
    let cookie = state
        .sessions
        .session_cookie(&token, state.config.secure_cookies);
    info!(user_id = %user.id, role = user.role.as_str(), "User signed in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Signed in",
            user: SessionUser::from(&user),
            token,
        }),
    ))
}

/// Self-service sign-up. New accounts are always OPERATOR.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .db
        .users()
        .create(&UserInput {
            document_number: request.document_number,
            full_name: request.full_name,
            email: request.email,
            password: Some(request.password),
            role: Role::Operator,
            status: true,
        })
        .await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered",
            user,
        }),
    ))
}

pub async fn me(user: CurrentUser) -> Json<SessionUser> {
    Json(user.into())
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = state.sessions.clear_cookie(state.config.secure_cookies);
    (
        [(SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Signed out",
        }),
    )
}

/// Issues a reset token when the email belongs to an active user. The
/// answer is the same either way.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if request.email.trim().is_empty() {
        return Err(ApiError::validation("email is required"));
    }

    let expires_at = Utc::now() + Duration::seconds(state.config.reset_token_lifetime_secs);
    if let Some(token) = state
        .db
        .users()
        .set_reset_token(&request.email, expires_at)
        .await?
    {
        info!(
            email = %request.email.trim(),
            reset_url = %state.config.reset_url(&token),
            "Password reset requested"
        );
    }

    Ok(Json(MessageResponse {
        message: "If the email is registered, a reset link has been generated",
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .db
        .users()
        .reset_password(request.token.trim(), &request.password)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ApiError::validation("Reset token is invalid or has expired")
            } else {
                e.into()
            }
        })?;

    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}
