//! Auth API Handlers

use axum::{Json, extract::State};
use shared::client::{LoginRequest, LoginResponse, RegisterRequest};
use shared::models::{Role, UserInfo};
use tracing::{info, warn};

use crate::auth::{CurrentUser, verify_password};
use crate::core::ServerState;
use crate::db::models::UserCreate;
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// POST /api/auth/register - 客户注册
///
/// 注册即登录：返回令牌与用户信息。
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    let username = payload.username.trim();
    if username.len() < 3 {
        return Err(AppError::validation(
            "Username must be at least 3 characters",
        ));
    }
    if payload.password.len() < 6 {
        return Err(AppError::validation(
            "Password must be at least 6 characters",
        ));
    }

    let repo = UserRepository::new(state.get_db());
    let user = repo
        .create(UserCreate {
            username: username.to_string(),
            password: payload.password,
            full_name: payload.full_name.trim().to_string(),
            role: Role::Customer,
        })
        .await?;

    info!(username = %user.username, "Customer registered");

    let info = user.to_info();
    let token = state
        .get_jwt_service()
        .generate_token(&info.id, &info.username, info.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    Ok(ok(LoginResponse { token, user: info }))
}

/// POST /api/auth/login - 登录
///
/// 用户不存在和密码错误返回同一错误，避免用户名枚举。
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    let repo = UserRepository::new(state.get_db());
    let user = repo.find_by_username(payload.username.trim()).await?;

    let Some(user) = user.filter(|u| u.is_active) else {
        warn!(target: "security", event = "login_failed", username = %payload.username);
        return Err(AppError::invalid_credentials());
    };

    let valid = verify_password(&payload.password, &user.hash_pass).unwrap_or(false);
    if !valid {
        warn!(target: "security", event = "login_failed", username = %payload.username);
        return Err(AppError::invalid_credentials());
    }

    let info = user.to_info();
    let token = state
        .get_jwt_service()
        .generate_token(&info.id, &info.username, info.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {}", e)))?;

    info!(username = %info.username, role = %info.role, "User logged in");

    Ok(ok(LoginResponse { token, user: info }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<UserInfo>>> {
    let repo = UserRepository::new(state.get_db());
    let record = repo
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(ok(record.to_info()))
}
