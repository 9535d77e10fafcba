//! In-memory credential store
//!
//! Intended for development and tests. All customers live in one
//! [`parking_lot::RwLock`]; uniqueness checks and the insert they guard happen
//! under the same write lock, so concurrent registrations of one username
//! cannot both succeed. Nothing is persisted.

use super::{CredentialStore, EMAIL_TAKEN, USERNAME_TAKEN};
use crate::{
    error::AppError,
    models::customer::{Customer, NewCustomer, ProfileUpdate},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Inner {
    next_id: i64,
    customers: BTreeMap<i64, Customer>,
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.customers
            .values()
            .any(|c| c.email == email && Some(c.customer_id) != except)
    }
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with an explicit role, bypassing registration (admin seeding)
    pub fn insert_with_role(
        &self,
        mut customer: NewCustomer,
        role: &str,
    ) -> Result<Customer, AppError> {
        customer.role = role.to_string();
        self.insert_locked(customer)
    }

    fn insert_locked(&self, customer: NewCustomer) -> Result<Customer, AppError> {
        let mut inner = self.inner.write();

        if inner.customers.values().any(|c| c.username == customer.username) {
            return Err(AppError::conflict(USERNAME_TAKEN));
        }
        if inner.email_taken(&customer.email, None) {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let stored = Customer {
            customer_id: inner.next_id,
            username: customer.username,
            password_hash: customer.password_hash,
            email: customer.email,
            first_name: customer.first_name,
            last_name: customer.last_name,
            address: customer.address,
            phone: customer.phone,
            role: customer.role,
            created_at: now,
            updated_at: now,
        };
        inner.customers.insert(stored.customer_id, stored.clone());

        Ok(stored)
    }
}

fn contains_ci(field: Option<&str>, needle: &str) -> bool {
    field
        .map(|f| f.to_lowercase().contains(needle))
        .unwrap_or(false)
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Customer>, AppError> {
        let inner = self.inner.read();
        Ok(inner
            .customers
            .values()
            .find(|c| c.username == username)
            .cloned())
    }

    async fn find_by_id(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        Ok(self.inner.read().customers.get(&customer_id).cloned())
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, AppError> {
        self.insert_locked(customer)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Customer>, AppError> {
        let inner = self.inner.read();
        Ok(inner
            .customers
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.inner.read().customers.len() as i64)
    }

    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<Customer>, AppError> {
        let needle = term.to_lowercase();
        let inner = self.inner.read();
        Ok(inner
            .customers
            .values()
            .filter(|c| {
                contains_ci(c.first_name.as_deref(), &needle)
                    || contains_ci(c.last_name.as_deref(), &needle)
                    || contains_ci(Some(c.username.as_str()), &needle)
            })
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        customer_id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<Customer>, AppError> {
        let mut inner = self.inner.write();

        if let Some(email) = &update.email {
            if inner.email_taken(email, Some(customer_id)) {
                return Err(AppError::conflict(EMAIL_TAKEN));
            }
        }

        let Some(customer) = inner.customers.get_mut(&customer_id) else {
            return Ok(None);
        };

        if let Some(email) = update.email {
            customer.email = email;
        }
        if let Some(first_name) = update.first_name {
            customer.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            customer.last_name = Some(last_name);
        }
        if let Some(address) = update.address {
            customer.address = Some(address);
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone);
        }
        customer.updated_at = Utc::now();

        Ok(Some(customer.clone()))
    }

    async fn update_password(
        &self,
        customer_id: i64,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write();
        match inner.customers.get_mut(&customer_id) {
            Some(customer) => {
                customer.password_hash = password_hash.to_string();
                customer.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        Ok(self.inner.write().customers.remove(&customer_id))
    }

    async fn ping(&self) -> Result<DateTime<Utc>, AppError> {
        Ok(Utc::now())
    }
}
