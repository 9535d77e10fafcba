//! Credential store layer
//!
//! Handlers and services only see [`CredentialStore`]; the backend is chosen
//! at startup (`storage.backend`).

pub mod customer_repo;
pub mod memory;

pub use customer_repo::PgCredentialStore;
pub use memory::MemoryCredentialStore;

use crate::{
    error::AppError,
    models::customer::{Customer, NewCustomer, ProfileUpdate},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub const USERNAME_TAKEN: &str = "Username already exists";
pub const EMAIL_TAKEN: &str = "Email already exists";

/// Customer credential storage
///
/// `insert` and `update_profile` enforce username/email uniqueness themselves
/// and report a collision as [`AppError::Conflict`]; callers never check for an
/// existing row first.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Customer>, AppError>;

    async fn find_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError>;

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Customer>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    /// Case-insensitive substring match on first name, last name or username
    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<Customer>, AppError>;

    async fn update_profile(
        &self,
        customer_id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<Customer>, AppError>;

    async fn update_password(&self, customer_id: i64, password_hash: &str)
        -> Result<bool, AppError>;

    async fn delete(&self, customer_id: i64) -> Result<Option<Customer>, AppError>;

    /// Round trip to the backend, returns its clock
    async fn ping(&self) -> Result<DateTime<Utc>, AppError>;
}

/// Escape LIKE metacharacters so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
