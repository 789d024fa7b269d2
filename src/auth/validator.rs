//! Bearer token validation.
//!
//! # Responsibilities
//! - Extract the raw token from an `Authorization` header
//! - Verify the HS256 signature against the configured secret
//! - Classify the result as Valid, Expired, Invalid or NotFound
//!
//! # Design Decisions
//! - Signature is verified before expiry, so an expired token is always a
//!   genuine one and never reported as Invalid
//! - Zero leeway on expiry
//! - Stateless per call; the key is built once and never mutated

use std::fmt;

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::auth::claims::Claims;

/// Case-sensitive scheme prefix of the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Result of validating one header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(Claims),
    Expired,
    Invalid,
    NotFound,
}

impl ValidationOutcome {
    /// The client-facing status for a rejected token, `None` when valid.
    pub fn rejection(&self) -> Option<TokenStatus> {
        match self {
            ValidationOutcome::Valid(_) => None,
            ValidationOutcome::Expired => Some(TokenStatus::Expired),
            ValidationOutcome::Invalid => Some(TokenStatus::Invalid),
            ValidationOutcome::NotFound => Some(TokenStatus::NotFound),
        }
    }
}

/// Rejection status reported in the error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenStatus {
    Expired,
    Invalid,
    NotFound,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Expired => "EXPIRED",
            TokenStatus::Invalid => "INVALID",
            TokenStatus::NotFound => "NOT_FOUND",
        }
    }

    /// Human-readable message for the error body.
    pub fn message(&self) -> &'static str {
        match self {
            TokenStatus::Expired => "Token has expired",
            TokenStatus::Invalid => "Token is invalid",
            TokenStatus::NotFound => "Token is missing or not a Bearer token",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("JWT signing secret is not configured")]
    MissingSecret,
}

/// Validates bearer tokens against a fixed HMAC key.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator").finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// Build a validator. Fails when the secret is empty.
    pub fn new(secret: &str) -> Result<Self, KeyError> {
        if secret.trim().is_empty() {
            return Err(KeyError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Validate an `Authorization` header value.
    pub fn validate(&self, header: Option<&str>) -> ValidationOutcome {
        let token = match header.and_then(|h| h.strip_prefix(BEARER_PREFIX)) {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => return ValidationOutcome::NotFound,
        };

        self.validate_token(token)
    }

    /// Validate a raw token without the scheme prefix.
    pub fn validate_token(&self, token: &str) -> ValidationOutcome {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => ValidationOutcome::Valid(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::warn!("Token rejected: expired");
                    ValidationOutcome::Expired
                }
                kind => {
                    tracing::warn!(reason = ?kind, "Token rejected: invalid");
                    ValidationOutcome::Invalid
                }
            },
        }
    }
}
