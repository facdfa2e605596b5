//! Session token issuance
//!
//! Tokens are RS256-signed `{sub, role, iat, exp}` claims. Verification is
//! shared with the api service through [`common::auth::TokenVerifier`].

use common::auth::{Claims, TokenError, TokenVerifier, load_pem};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::User;

/// Default token lifetime: 7 days
pub const DEFAULT_TOKEN_EXPIRY: u64 = 604_800;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Token lifetime in seconds
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: private key (PEM) or path to it
    /// - `JWT_PUBLIC_KEY`: public key (PEM) or path to it
    /// - `JWT_TOKEN_EXPIRY`: token lifetime in seconds (default: 604800)
    pub fn from_env(base_dir: &str) -> Result<Self, TokenError> {
        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        Ok(JwtConfig {
            private_key: load_pem("JWT_PRIVATE_KEY", base_dir)?,
            public_key: load_pem("JWT_PUBLIC_KEY", base_dir)?,
            token_expiry,
        })
    }
}

/// A freshly signed token and the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    token_expiry: u64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|e| TokenError::Key(format!("invalid private key: {}", e)))?;

        Ok(JwtService {
            encoding_key,
            verifier: TokenVerifier::from_public_pem(&config.public_key)?,
            token_expiry: config.token_expiry,
        })
    }

    /// Sign a session token for a user
    pub fn issue(&self, user: &User) -> Result<IssuedToken, TokenError> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now,
            exp: now + self.token_expiry,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn token_expiry(&self) -> u64 {
        self.token_expiry
    }
}

/// Seconds until a token expires, zero once it has
pub fn remaining_lifetime(claims: &Claims) -> Result<u64, TokenError> {
    Ok(claims.exp.saturating_sub(now_secs()?))
}

fn now_secs() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|e| TokenError::Key(format!("system clock before epoch: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::auth::Role;
    use media::HostedAsset;
    use serial_test::serial;
    use uuid::Uuid;

    const PRIVATE_KEY: &str = include_str!("../../../fixtures/jwt/private.pem");
    const PUBLIC_KEY: &str = include_str!("../../../fixtures/jwt/public.pem");

    fn service() -> JwtService {
        JwtService::new(&JwtConfig {
            private_key: PRIVATE_KEY.to_string(),
            public_key: PUBLIC_KEY.to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        })
        .unwrap()
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            profile_picture: HostedAsset {
                id: "avatars/placeholder.jpg".to_string(),
                url: "https://media.test/avatars/placeholder.jpg".to_string(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let service = service();
        let admin = user(Role::Admin);

        let issued = service.issue(&admin).unwrap();
        assert_eq!(issued.claims.exp - issued.claims.iat, DEFAULT_TOKEN_EXPIRY);

        let claims = service.verifier().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, Role::Admin);
        assert!(remaining_lifetime(&claims).unwrap() > DEFAULT_TOKEN_EXPIRY - 60);
    }

    #[test]
    fn test_rejects_bad_private_key() {
        let result = JwtService::new(&JwtConfig {
            private_key: "not a key".to_string(),
            public_key: PUBLIC_KEY.to_string(),
            token_expiry: 60,
        });
        assert!(matches!(result, Err(TokenError::Key(_))));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("JWT_PRIVATE_KEY", PRIVATE_KEY);
            std::env::set_var("JWT_PUBLIC_KEY", "../../fixtures/jwt/public.pem");
            std::env::set_var("JWT_TOKEN_EXPIRY", "3600");
        }

        let config = JwtConfig::from_env(env!("CARGO_MANIFEST_DIR")).unwrap();
        assert_eq!(config.token_expiry, 3600);
        assert!(config.public_key.starts_with("-----BEGIN PUBLIC KEY-----"));

        unsafe {
            std::env::remove_var("JWT_PRIVATE_KEY");
            std::env::remove_var("JWT_PUBLIC_KEY");
            std::env::remove_var("JWT_TOKEN_EXPIRY");
        }
    }
}
