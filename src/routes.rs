//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公共路由（无需认证）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/v1/auth/logout", post(handlers::auth::logout));

    // 登录/注册（按 IP 限流）
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::login_rate_limit_middleware,
        ));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        .route("/api/v1/customers", get(handlers::customer::list_customers))
        .route(
            "/api/v1/customers/search",
            get(handlers::customer::search_customers),
        )
        .route(
            "/api/v1/customers/profile",
            get(handlers::customer::get_profile)
                .put(handlers::customer::update_profile)
                .delete(handlers::customer::delete_profile),
        )
        .route(
            "/api/v1/customers/profile/password",
            put(handlers::customer::change_password),
        )
        .route(
            "/api/v1/customers/{id}",
            get(handlers::customer::get_customer)
                .put(handlers::customer::update_customer)
                .delete(handlers::customer::delete_customer),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    let body_limit = state.config.server.body_limit_bytes;

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .fallback(handlers::route_not_found)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
