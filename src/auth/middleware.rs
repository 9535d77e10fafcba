//! JWT 认证中间件

use crate::{auth::jwt::JwtService, error::AppError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 管理员角色名
pub const ADMIN_ROLE: &str = "admin";

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub customer_id: i64,
    pub username: String,
    pub role: Option<String>,
    pub expires_at: i64,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// 只允许本人或管理员操作指定客户
    pub fn require_self_or_admin(&self, customer_id: i64) -> Result<(), AppError> {
        if self.customer_id == customer_id || self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(
                actor = self.customer_id,
                target = customer_id,
                "Customer tried to modify another customer"
            );
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::MissingToken)
    }
}

/// 从 Authorization 头提取令牌
/// 缺失、前缀不是 Bearer 或令牌为空都视为未认证
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AppError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    Ok(token)
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = {
        let token = extract_token(req.headers())?;
        jwt_service.verify(token)?
    };

    let auth_context = AuthContext {
        customer_id: claims.customer_id()?,
        username: claims.username,
        role: claims.role,
        expires_at: claims.exp,
    };

    tracing::debug!(customer_id = auth_context.customer_id, "Request authenticated");

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
