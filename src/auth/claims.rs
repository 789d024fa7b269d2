//! Token claims carried by user-service access tokens.

use serde::{Deserialize, Serialize};

/// Decoded access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub id: i64,

    /// Role name, forwarded as `X-Role`.
    pub role: String,

    /// Issued at (Unix seconds).
    #[serde(default)]
    pub iat: i64,

    /// Expiry (Unix seconds).
    pub exp: i64,
}
