//! Authentication Handlers
//!
//! Handles login, first-admin bootstrap and current-user lookup

use std::time::Duration;

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::api::email_conflict;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_email, validate_password, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{LoginRequest, LoginResponse, Role, User};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 300;

/// `POST /api/auth/register-admin` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterAdminRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login handler
///
/// Authenticates email/password and returns a JWT with the user
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = req.email.trim().to_string();
    let found = user::find_by_email(&state.pool, &email).await?;

    // Fixed delay before checking result
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent email enumeration
    let user = match found {
        Some(u) => {
            let valid = verify_password(&req.password, &u.password_hash)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
            if !valid {
                security_log!("WARN", "login_failed", email = email.as_str(), reason = "invalid_password");
                return Err(AppError::invalid_credentials());
            }
            u
        }
        None => {
            security_log!("WARN", "login_failed", email = email.as_str(), reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    let token = state
        .get_jwt_service()
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        user_id = user.id,
        role = %user.role,
        branch_code = ?user.branch_code,
        "User logged in successfully"
    );

    Ok(Json(LoginResponse { token, user }))
}

/// One-time bootstrap of the first admin
///
/// Closed (403 AdminAlreadyExists) as soon as any admin exists.
pub async fn register_admin(
    State(state): State<ServerState>,
    Json(req): Json<RegisterAdminRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let name = req.name.unwrap_or_default();
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    validate_required_text(&name, "name", MAX_NAME_LEN)?;
    validate_email(&email)?;
    validate_password(&password)?;

    if user::count_by_role(&state.pool, &Role::Admin).await? > 0 {
        security_log!("WARN", "register_admin_closed", email = email.as_str());
        return Err(AppError::new(ErrorCode::AdminAlreadyExists));
    }

    let password_hash = hash_password(&password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    let admin = user::create(
        &state.pool,
        user::NewUser {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash,
            role: Role::Admin,
            branch_code: None,
        },
        state.now_millis(),
    )
    .await
    .map_err(email_conflict)?;

    security_log!("INFO", "admin_registered", user_id = admin.id);
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Get current user info
pub async fn me(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    // Fresh row; the token may predate a rename or branch move
    let user = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(user))
}
