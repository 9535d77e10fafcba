//! Customer repository (PostgreSQL)

use super::{escape_like, CredentialStore, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::{
    error::AppError,
    models::customer::{Customer, NewCustomer, ProfileUpdate},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    /// 根据用户名查找客户
    async fn find_by_username(&self, username: &str) -> Result<Option<Customer>, AppError> {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.db)
                .await?;

        Ok(customer)
    }

    /// 根据 ID 查找客户
    async fn find_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE customer_id = $1")
                .bind(customer_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(customer)
    }

    /// 创建客户，唯一约束冲突映射为 Conflict
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                username, password_hash, email, first_name, last_name, address, phone, role
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&customer.username)
        .bind(&customer.password_hash)
        .bind(&customer.email)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.role)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers ORDER BY customer_id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<Customer>, AppError> {
        let pattern = format!("%{}%", escape_like(term));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE first_name ILIKE $1 ESCAPE '\'
               OR last_name ILIKE $1 ESCAPE '\'
               OR username ILIKE $1 ESCAPE '\'
            ORDER BY customer_id
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// 部分更新资料，未提供的字段保持不变
    async fn update_profile(
        &self,
        customer_id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                address = COALESCE($5, address),
                phone = COALESCE($6, phone),
                updated_at = NOW()
            WHERE customer_id = $1
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(&update.email)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.address)
        .bind(&update.phone)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)
    }

    async fn update_password(
        &self,
        customer_id: i64,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE customers SET password_hash = $2, updated_at = NOW() WHERE customer_id = $1",
        )
        .bind(customer_id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "DELETE FROM customers WHERE customer_id = $1 RETURNING *",
        )
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(customer)
    }

    async fn ping(&self) -> Result<DateTime<Utc>, AppError> {
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&self.db)
            .await?;

        Ok(now)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

/// 23505 -> Conflict，根据约束名区分用户名和邮箱
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if !is_unique_violation(&err) {
        return AppError::Database(err);
    }

    let constraint = match &err {
        sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };

    if constraint.contains("email") {
        AppError::conflict(EMAIL_TAKEN)
    } else {
        AppError::conflict(USERNAME_TAKEN)
    }
}
