//! 认证提取器
//!
//! 允许处理函数以参数形式接收 [`CurrentUser`]。

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{CurrentUser, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // 中间件已注入则直接复用
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = JwtService::extract_from_header(auth_header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        let claims = state
            .get_jwt_service()
            .validate_token(token)
            .map_err(|e| match e {
                crate::auth::JwtError::ExpiredToken => AppError::TokenExpired,
                _ => AppError::invalid_token("Invalid token"),
            })?;

        let user = CurrentUser::from(claims);
        parts.extensions.insert(user.clone());

        Ok(user)
    }
}
