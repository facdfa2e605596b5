//! Caller identity shared by the auth and api services
//!
//! The auth service signs session tokens with its RSA private key; every
//! service verifies them with the matching public key. A token carries the
//! user id and role and travels either in the `authToken` cookie or in an
//! `Authorization: Bearer` header.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Name of the HTTP-only cookie that carries the session token
pub const AUTH_COOKIE: &str = "authToken";

/// Coarse-grained permission tag on a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Role at issuance time
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Errors raised while reading or verifying a session token
#[derive(Debug, Error)]
pub enum TokenError {
    /// No token in the cookie or the Authorization header
    #[error("no session token supplied")]
    Missing,

    /// Signature, shape or expiry check failed
    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// Key material could not be loaded
    #[error("token key error: {0}")]
    Key(String),
}

/// Read PEM key material from an environment variable
///
/// The variable holds either the PEM text itself or a path to a PEM file.
/// Relative paths are tried from the working directory first, then from
/// `base_dir`.
pub fn load_pem(var: &str, base_dir: &str) -> Result<String, TokenError> {
    let value =
        std::env::var(var).map_err(|_| TokenError::Key(format!("{} is not set", var)))?;

    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    std::fs::read_to_string(&value)
        .or_else(|_| std::fs::read_to_string(std::path::Path::new(base_dir).join(&value)))
        .map(|pem| pem.trim().to_string())
        .map_err(|e| TokenError::Key(format!("failed to read {} from {}: {}", var, value, e)))
}

/// Verifies RS256 session tokens against a public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key
    pub fn from_public_pem(public_key: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| TokenError::Key(format!("invalid public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from `JWT_PUBLIC_KEY`
    pub fn from_env(base_dir: &str) -> Result<Self, TokenError> {
        Self::from_public_pem(&load_pem("JWT_PUBLIC_KEY", base_dir)?)
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Pull the session token out of a request
///
/// The cookie wins over the header when both are present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const PRIVATE_KEY: &str = include_str!("../../../fixtures/jwt/private.pem");
    const PUBLIC_KEY: &str = include_str!("../../../fixtures/jwt/public.pem");

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(claims: &Claims) -> String {
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::User.to_string(), "user");
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = TokenVerifier::from_public_pem(PUBLIC_KEY).unwrap();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::Admin,
            iat: now(),
            exp: now() + 3600,
        };

        let verified = verifier.verify(&sign(&claims)).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = TokenVerifier::from_public_pem(PUBLIC_KEY).unwrap();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::User,
            iat: now() - 7200,
            exp: now() - 3600,
        };

        assert!(matches!(
            verifier.verify(&sign(&claims)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = TokenVerifier::from_public_pem(PUBLIC_KEY).unwrap();
        assert!(verifier.verify("not-a-token").is_err());
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; authToken=from-cookie"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_token_missing_or_malformed() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
