//! PostgreSQL 凭据存储的连接池与迁移

use crate::{config::DatabaseConfig, error::AppError};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 创建连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            // 连接串可能含口令，只记录错误本身
            tracing::error!(error = %e, "Failed to connect to credential database");
            AppError::Database(e)
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Credential database pool created"
    );

    Ok(pool)
}

/// 应用内嵌迁移（customers 表及唯一约束）
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Credential schema migration failed");
        AppError::Internal(format!("Migration failed: {}", e))
    })?;

    Ok(())
}

/// 连接、迁移并报告现有客户数量
pub async fn init_credential_db(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&pool)
        .await?;
    tracing::info!(customers, "Credential database ready");

    Ok(pool)
}

/// 记录连接池指标
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("db_pool_size").set(pool.size() as f64);
    metrics::gauge!("db_pool_idle").set(pool.num_idle() as f64);
}
