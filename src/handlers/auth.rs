//! 认证相关的 HTTP 处理器

use super::ValidatedJson;
use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::auth::{LoginRequest, MeResponse, RegisterRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 登出
/// 令牌无状态，服务端不做任何处理，客户端丢弃令牌即可
pub async fn logout() -> impl IntoResponse {
    Json(json!({"message": "Logged out, discard the token on the client"}))
}

/// 获取当前令牌信息
pub async fn me(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    let expires_at = Utc
        .timestamp_opt(auth_context.expires_at, 0)
        .single()
        .ok_or(AppError::InvalidToken)?;

    Ok(Json(MeResponse {
        customer_id: auth_context.customer_id,
        username: auth_context.username,
        role: auth_context.role,
        expires_at,
    }))
}
