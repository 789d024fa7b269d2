//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → validator.rs (prefix check, signature, expiry)
//!     → ValidationOutcome { Valid(claims) | Expired | Invalid | NotFound }
//!     → filters::auth (inject X-Member-Id / X-Role or reject with 401)
//! ```
//!
//! # Design Decisions
//! - The gateway only verifies tokens; issuing and refreshing them is the
//!   user-service's job
//! - Tokens are never cached; each request re-validates

pub mod claims;
pub mod validator;

pub use claims::Claims;
pub use validator::{KeyError, TokenStatus, TokenValidator, ValidationOutcome, BEARER_PREFIX};
