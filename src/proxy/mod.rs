//! Proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Filtered request
//!     → forwarder.rs (buffer body, rewrite URI)
//!     → per attempt: breaker admit → send with timeout → record outcome
//!     → retry with backoff, or return response / fallback / 502 / 504
//! ```

pub mod forwarder;

pub use forwarder::{Forwarder, ProxyError};
