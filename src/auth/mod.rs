//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{token_fingerprint, Claims, IssuedToken, JwtService};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext, ADMIN_ROLE};
pub use password::PasswordHasher;
