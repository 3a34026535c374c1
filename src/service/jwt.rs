use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::PortalError;
use crate::types::user::Role;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, PortalError> {
        self.sub
            .parse()
            .map_err(|_| PortalError::Unauthorized("malformed subject".to_string()))
    }
}

/// Issues and checks HS256 session tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, PortalError> {
        Ok(Self::new(cfg.signing_secret()?, cfg.jwt_ttl()?))
    }

    pub fn create_token(&self, user_id: i64, email: &str, role: Role) -> Result<String, PortalError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now.saturating_add(ttl),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Decode `token`, rejecting bad signatures and expired tokens.
    pub fn verify_token(&self, token: &str) -> Result<Claims, PortalError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[test]
    fn create_and_verify_token() {
        let service = JwtService::new("test_secret_key", DAY);
        let token = service
            .create_token(42, "alice@example.com", Role::Employer)
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Employer);

        let expires_in = claims.exp - Utc::now().timestamp();
        assert!(expires_in > 23 * 3600);
        assert!(expires_in <= 24 * 3600);
    }

    #[test]
    fn invalid_token() {
        let service = JwtService::new("test_secret_key", DAY);
        assert!(matches!(
            service.verify_token("invalid_token"),
            Err(PortalError::Jwt(_))
        ));
    }

    #[test]
    fn wrong_secret() {
        let issuer = JwtService::new("secret1", DAY);
        let other = JwtService::new("secret2", DAY);
        let token = issuer
            .create_token(1, "bob@example.com", Role::JobSeeker)
            .unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn expired_token() {
        let service = JwtService::new("test_secret_key", DAY);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            email: "old@example.com".to_string(),
            role: Role::Admin,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();
        assert!(service.verify_token(&token).is_err());
    }
}
