//! Edge API Gateway
//!
//! A single entry point in front of a set of backend services, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌─────────────────────────────────────────────────────────┐
//!                              │                      EDGE GATEWAY                        │
//!                              │                                                          │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐         │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing │───▶│   filters    │         │
//!                              │  │ server  │    │  table  │    │ log/auth/... │         │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘         │
//!                              │                                       │                  │
//!                              │                                       ▼                  │
//!                              │                               ┌──────────────┐          │
//!                              │                               │    proxy     │          │
//!                              │                               │ breaker+retry│          │
//!                              │                               └──────┬───────┘          │
//!                              │                                       │                  │
//!     Client Response          │  ┌─────────┐                          ▼                  │
//!     ◀────────────────────────┼──│response │◀──── backend response / fallback ◀─────────┼──── Backend
//!                              │  └─────────┘                                             │     Service
//!                              │                                                          │
//!                              │  ┌────────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns                 │ │
//!                              │  │  ┌─────────┐ ┌────────┐ ┌──────────┐ ┌───────────┐ │ │
//!                              │  │  │ config  │ │ health │ │observa-  │ │   auth    │ │ │
//!                              │  │  │         │ │ report │ │ bility   │ │  tokens   │ │ │
//!                              │  │  └─────────┘ └────────┘ └──────────┘ └───────────┘ │ │
//!                              │  │  ┌─────────────────┐  ┌─────────────────────────┐  │ │
//!                              │  │  │   resilience    │  │       lifecycle         │  │ │
//!                              │  │  │ breakers/retry  │  │   signals/shutdown      │  │ │
//!                              │  │  └─────────────────┘  └─────────────────────────┘  │ │
//!                              │  └────────────────────────────────────────────────────┘ │
//!                              └─────────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Request pipeline
pub mod auth;
pub mod filters;
pub mod proxy;

// Cross-cutting concerns
pub mod admin;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
