//! Customer domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Role assigned at registration
pub const DEFAULT_ROLE: &str = "user";

/// Customer account as stored. Deliberately not `Serialize`: the password
/// hash must never leave the process.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,

    // Profile
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,

    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the credential store
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

/// Partial profile update, `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
    }
}

/// Update profile request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            email: req.email.map(|e| e.trim().to_lowercase()),
            first_name: req.first_name,
            last_name: req.last_name,
            address: req.address,
            phone: req.phone,
        }
    }
}

/// Change password request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "current_password is required"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "new_password is required"))]
    pub new_password: String,
}

/// Customer response (without sensitive data)
#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub customer_id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.customer_id,
            username: customer.username,
            email: customer.email,
            first_name: customer.first_name,
            last_name: customer.last_name,
            address: customer.address,
            phone: customer.phone,
            role: customer.role,
            created_at: customer.created_at,
        }
    }
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    /// (limit, offset) clamped to sane bounds
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Name search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

/// Customer list response
#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub total: i64,
    pub customers: Vec<CustomerResponse>,
}

/// Usernames: ASCII letters, digits and `._-@`, no surrounding whitespace
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset")
            .with_message("username may only contain letters, digits and . _ - @".into()))
    }
}
