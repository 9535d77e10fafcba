//! 客户资料处理器

use super::{ApiPath, ApiQuery, ValidatedJson};
use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::customer::{
        ChangePasswordRequest, ListQuery, ProfileUpdate, SearchQuery, UpdateProfileRequest,
    },
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 客户列表
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.customer_service.list(&query).await?;
    Ok(Json(response))
}

/// 按姓名搜索
pub async fn search_customers(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let customers = state
        .customer_service
        .search(query.name.as_deref())
        .await?;
    Ok(Json(customers))
}

/// 当前客户资料
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customer_service.get(auth_context.customer_id).await?;
    Ok(Json(customer))
}

/// 更新当前客户资料
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .customer_service
        .update(auth_context.customer_id, ProfileUpdate::from(req))
        .await?;
    Ok(Json(customer))
}

/// 注销当前账户
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customer_service.delete(auth_context.customer_id).await?;
    Ok(Json(json!({
        "message": "Customer deleted",
        "customer": customer,
    })))
}

/// 修改当前客户密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .customer_service
        .change_password(auth_context.customer_id, req)
        .await?;
    Ok(Json(json!({"message": "Password updated"})))
}

/// 根据 ID 获取客户
pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    ApiPath(customer_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state.customer_service.get(customer_id).await?;
    Ok(Json(customer))
}

/// 根据 ID 更新客户（本人或管理员）
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ApiPath(customer_id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_self_or_admin(customer_id)?;

    let customer = state
        .customer_service
        .update(customer_id, ProfileUpdate::from(req))
        .await?;
    Ok(Json(customer))
}

/// 根据 ID 删除客户（本人或管理员）
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ApiPath(customer_id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    auth_context.require_self_or_admin(customer_id)?;

    let customer = state.customer_service.delete(customer_id).await?;
    Ok(Json(json!({
        "message": "Customer deleted",
        "customer": customer,
    })))
}
