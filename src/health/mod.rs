//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! On demand (GET /actuator/health):
//!     aggregator.rs
//!     → Probe each service concurrently, each with its own timeout
//!     → HealthSnapshot { UP | DOWN, per-service detail }
//!
//! Background (monitor.rs):
//!     Periodic timer
//!     → aggregator.rs
//!     → Log transitions, export gauges
//! ```
//!
//! # Design Decisions
//! - Health is reported, never used to steer routing
//! - Probes are independent; one slow service cannot delay the report
//!   beyond its own timeout

pub mod aggregator;
pub mod monitor;

pub use aggregator::{HealthAggregator, HealthSnapshot, HealthStatus, ServiceHealth};
pub use monitor::HealthMonitor;
