//! 客户资料服务

use crate::{
    auth::password::PasswordHasher,
    config::AppConfig,
    error::AppError,
    models::customer::{
        ChangePasswordRequest, CustomerListResponse, CustomerResponse, ListQuery, ProfileUpdate,
    },
    repository::CredentialStore,
};
use std::sync::Arc;

pub struct CustomerService {
    store: Arc<dyn CredentialStore>,
    password_hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl CustomerService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        password_hasher: PasswordHasher,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            password_hasher,
            config,
        }
    }

    pub async fn get(&self, customer_id: i64) -> Result<CustomerResponse, AppError> {
        self.store
            .find_by_id(customer_id)
            .await?
            .map(CustomerResponse::from)
            .ok_or_else(|| AppError::not_found("customer"))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<CustomerListResponse, AppError> {
        let (limit, offset) = query.bounds();

        let customers = self.store.list(limit, offset).await?;
        let total = self.store.count().await?;

        Ok(CustomerListResponse {
            total,
            customers: customers.into_iter().map(CustomerResponse::from).collect(),
        })
    }

    /// 按姓名搜索，空关键字为 400，无结果为 404
    pub async fn search(&self, name: Option<&str>) -> Result<Vec<CustomerResponse>, AppError> {
        let term = name.map(str::trim).unwrap_or_default();
        if term.is_empty() {
            return Err(AppError::BadRequest(
                "Query parameter 'name' is required".to_string(),
            ));
        }

        let customers = self.store.search_by_name(term, ListQuery::MAX_LIMIT).await?;
        if customers.is_empty() {
            return Err(AppError::NotFound(format!("no customer matching '{}'", term)));
        }

        Ok(customers.into_iter().map(CustomerResponse::from).collect())
    }

    pub async fn update(
        &self,
        customer_id: i64,
        update: ProfileUpdate,
    ) -> Result<CustomerResponse, AppError> {
        if update.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let customer = self
            .store
            .update_profile(customer_id, update)
            .await?
            .ok_or_else(|| AppError::not_found("customer"))?;

        tracing::info!(customer_id, "Customer profile updated");

        Ok(CustomerResponse::from(customer))
    }

    pub async fn delete(&self, customer_id: i64) -> Result<CustomerResponse, AppError> {
        let customer = self
            .store
            .delete(customer_id)
            .await?
            .ok_or_else(|| AppError::not_found("customer"))?;

        tracing::info!(
            customer_id,
            username = %customer.username,
            "Customer deleted"
        );

        Ok(CustomerResponse::from(customer))
    }

    /// 修改密码，需要校验当前密码
    pub async fn change_password(
        &self,
        customer_id: i64,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let customer = self
            .store
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| AppError::not_found("customer"))?;

        let valid = self
            .password_hasher
            .verify_blocking(req.current_password, customer.password_hash)
            .await?;
        if !valid {
            tracing::info!(customer_id, reason = "wrong_password", "Password change rejected");
            return Err(AppError::InvalidCredentials);
        }

        PasswordHasher::validate_policy(&req.new_password, &self.config.security)?;

        let password_hash = self.password_hasher.hash_blocking(req.new_password).await?;
        if !self.store.update_password(customer_id, &password_hash).await? {
            return Err(AppError::not_found("customer"));
        }

        tracing::info!(customer_id, "Password changed");

        Ok(())
    }
}
