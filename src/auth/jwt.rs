//! JWT token issuance and verification
//!
//! Tokens are HS256-signed and stateless: nothing is stored server side, a
//! token stays valid until `exp`. Verification checks the signature first and
//! the expiry second, so a tampered token is always reported as invalid even
//! when it is also past its expiry.

use crate::{config::AppConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Minimum secret length for HS256
pub const MIN_SECRET_LEN: usize = 32;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (customer ID)
    pub sub: String,

    /// Username
    pub username: String,

    /// Role, absent for tokens minted without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl Claims {
    /// Customer ID carried in `sub`
    pub fn customer_id(&self) -> Result<i64, AppError> {
        self.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }
}

/// A freshly signed token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// seconds until the token expires
    pub expires_in: u64,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl JwtService {
    /// Create JWT service from a raw secret and TTL
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT secret too short (min {} bytes)",
                MIN_SECRET_LEN
            )));
        }

        if ttl_secs == 0 {
            return Err(AppError::Config("Token TTL must be positive".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret().as_bytes(),
            config.security.token_ttl_secs,
        )
    }

    /// Issue a token for a customer
    pub fn issue(
        &self,
        customer_id: i64,
        username: &str,
        role: Option<&str>,
    ) -> Result<IssuedToken, AppError> {
        self.issue_at(customer_id, username, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        customer_id: i64,
        username: &str,
        role: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = now + Duration::seconds(self.ttl_secs as i64);

        let claims = Claims {
            sub: customer_id.to_string(),
            username: username.to_string(),
            role: role.map(|r| r.to_string()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("Failed to encode token: {:?}", e);
                AppError::Internal(format!("Failed to encode token: {}", e))
            })?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.ttl_secs,
        })
    }

    /// Verify a token against the current clock
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        // Expiry is checked below against `now`, not the library clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(
                    fingerprint = %token_fingerprint(token),
                    kind = ?e.kind(),
                    "Token validation failed"
                );
                AppError::InvalidToken
            })?
            .claims;

        if claims.exp <= now.timestamp() {
            tracing::debug!(
                fingerprint = %token_fingerprint(token),
                exp = claims.exp,
                "Token expired"
            );
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }
}

/// Short SHA-256 prefix used to correlate a token in logs without logging it
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
