//! 认证服务：注册、登录

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    models::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        customer::{Customer, CustomerResponse, NewCustomer, DEFAULT_ROLE},
    },
    repository::CredentialStore,
};
use std::sync::Arc;

pub const TOKEN_TYPE: &str = "Bearer";

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt_service: Arc<JwtService>,
    password_hasher: PasswordHasher,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt_service: Arc<JwtService>,
        password_hasher: PasswordHasher,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            jwt_service,
            password_hasher,
            config,
        }
    }

    /// 注册新客户并直接签发令牌
    ///
    /// 角色固定为 `user`，唯一性由存储层保证，重复的用户名或邮箱返回 Conflict
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        PasswordHasher::validate_policy(&req.password, &self.config.security)?;

        let password_hash = self.password_hasher.hash_blocking(req.password).await?;

        let new_customer = NewCustomer {
            first_name: req.first_name.or_else(|| Some(req.username.clone())),
            username: req.username,
            password_hash,
            email: req.email.trim().to_lowercase(),
            last_name: req.last_name,
            address: req.address,
            phone: req.phone,
            role: DEFAULT_ROLE.to_string(),
        };

        let customer = match self.store.insert(new_customer).await {
            Ok(customer) => customer,
            Err(e) => {
                let outcome = if matches!(e, AppError::Conflict(_)) {
                    "conflict"
                } else {
                    "error"
                };
                metrics::counter!("auth_register_total", "outcome" => outcome).increment(1);
                return Err(e);
            }
        };

        metrics::counter!("auth_register_total", "outcome" => "success").increment(1);
        tracing::info!(
            customer_id = customer.customer_id,
            username = %customer.username,
            "Customer registered"
        );

        self.issue_for(customer)
    }

    /// 登录
    ///
    /// 用户不存在与密码错误返回同一个错误，且都执行一次完整的哈希校验
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let Some(customer) = self.store.find_by_username(&req.username).await? else {
            self.password_hasher.verify_dummy_blocking(req.password).await;
            metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
            tracing::info!(reason = "unknown_user", "Login failed");
            return Err(AppError::InvalidCredentials);
        };

        let valid = self
            .password_hasher
            .verify_blocking(req.password, customer.password_hash.clone())
            .await?;

        if !valid {
            metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
            tracing::info!(
                customer_id = customer.customer_id,
                reason = "wrong_password",
                "Login failed"
            );
            return Err(AppError::InvalidCredentials);
        }

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        tracing::info!(
            customer_id = customer.customer_id,
            username = %customer.username,
            "Customer logged in"
        );

        self.issue_for(customer)
    }

    fn issue_for(&self, customer: Customer) -> Result<AuthResponse, AppError> {
        let issued = self.jwt_service.issue(
            customer.customer_id,
            &customer.username,
            Some(&customer.role),
        )?;

        Ok(AuthResponse {
            token: issued.token,
            token_type: TOKEN_TYPE,
            expires_in: issued.expires_in,
            expires_at: issued.expires_at,
            customer: CustomerResponse::from(customer),
        })
    }
}
