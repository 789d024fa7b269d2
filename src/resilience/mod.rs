//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend (per attempt):
//!     → registry.rs (admit through the route's named breaker)
//!     → Denied: fallback response, no network call
//!     → Admitted: call with timeout, classify via retries.rs
//!     → circuit_breaker.rs (record outcome on the permit)
//!     → On failure: retries.rs (retry with fixed backoff while budget remains)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Circuit breaker prevents cascading failures
//! - Breaker and retry are independent of the HTTP client

pub mod circuit_breaker;
pub mod registry;
pub mod retries;

pub use circuit_breaker::{BreakerSnapshot, CallOutcome, CircuitBreaker, CircuitState, Permit};
pub use registry::BreakerRegistry;
pub use retries::{AttemptResult, RetryPolicy};
