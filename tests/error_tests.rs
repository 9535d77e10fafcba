//! 错误处理单元测试
//!
//! 测试应用错误类型的状态码、原因码和响应格式

use account_service::error::{AppError, ErrorDetail, ErrorResponse};
use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound("resource".to_string()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Conflict("dup".to_string()).status_code(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::BadRequest("invalid".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::Validation("error".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_server_error_status_codes() {
    assert_eq!(
        AppError::Database(sqlx::Error::RowNotFound).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Config("Invalid config".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Internal("Something went wrong".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// ==================== 原因码测试 ====================

#[test]
fn test_reasons() {
    assert_eq!(AppError::InvalidCredentials.reason(), "invalid_credentials");
    assert_eq!(AppError::MissingToken.reason(), "missing_token");
    assert_eq!(AppError::InvalidToken.reason(), "invalid_token");
    assert_eq!(AppError::TokenExpired.reason(), "token_expired");
    assert_eq!(AppError::Forbidden.reason(), "forbidden");
    assert_eq!(AppError::Conflict("x".to_string()).reason(), "conflict");
    assert_eq!(AppError::Validation("x".to_string()).reason(), "validation_failed");
    assert_eq!(AppError::RateLimitExceeded.reason(), "rate_limited");
    assert_eq!(AppError::Internal("x".to_string()).reason(), "internal");
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    // 数据库错误不应该暴露技术细节
    let db_error = AppError::Database(sqlx::Error::RowNotFound);
    let message = db_error.user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));
    assert!(!message.to_lowercase().contains("row"));

    let config_error = AppError::Config("Missing JWT secret".to_string());
    let message = config_error.user_message();
    assert_eq!(message, "Configuration error");
    assert!(!message.contains("JWT"));
}

#[test]
fn test_user_messages_for_client_errors() {
    assert_eq!(
        AppError::InvalidCredentials.user_message(),
        "Invalid username or password"
    );
    assert_eq!(AppError::Forbidden.user_message(), "Access denied");
    assert_eq!(
        AppError::NotFound("customer".to_string()).user_message(),
        "Resource not found: customer"
    );
    assert_eq!(
        AppError::Conflict("Username already exists".to_string()).user_message(),
        "Username already exists"
    );
    assert_eq!(
        AppError::Validation("Email required".to_string()).user_message(),
        "Email required"
    );
}

#[test]
fn test_convenience_methods() {
    let err = AppError::not_found("customer");
    assert!(matches!(err, AppError::NotFound(ref msg) if msg == "customer"));

    let err = AppError::validation("Invalid email");
    assert!(matches!(err, AppError::Validation(ref msg) if msg == "Invalid email"));

    let err = AppError::conflict("Email already exists");
    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Email already exists"));
}

#[test]
fn test_from_sqlx_error() {
    let app_error = AppError::from(sqlx::Error::RowNotFound);
    assert!(matches!(app_error, AppError::Database(_)));
}

#[test]
fn test_from_config_error() {
    let app_error = AppError::from(config::ConfigError::Message("missing".to_string()));
    assert!(matches!(app_error, AppError::Config(_)));
}

// ==================== 错误序列化测试 ====================

#[test]
fn test_error_response_serialization() {
    let error_response = ErrorResponse {
        error: ErrorDetail {
            code: 404,
            reason: "not_found",
            message: "Resource not found".to_string(),
            request_id: "req-123".to_string(),
        },
    };

    let json = serde_json::to_value(&error_response).unwrap();

    assert_eq!(json["error"]["code"], 404);
    assert_eq!(json["error"]["reason"], "not_found");
    assert_eq!(json["error"]["message"], "Resource not found");
    assert_eq!(json["error"]["request_id"], "req-123");
}

#[tokio::test]
async fn test_into_response_body() {
    let response = AppError::TokenExpired.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 401);
    assert_eq!(json["error"]["reason"], "token_expired");
    assert_eq!(json["error"]["message"], "Token expired");
    assert!(!json["error"]["request_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_internal_error_body_is_generic() {
    let response = AppError::Internal("argon2 blew up at line 42".to_string()).into_response();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["message"], "Internal server error");
    assert!(!json.to_string().contains("argon2"));
}
