//! Business logic services layer

pub mod auth_service;
pub mod customer_service;

pub use auth_service::AuthService;
pub use customer_service::CustomerService;
