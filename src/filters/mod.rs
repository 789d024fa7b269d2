//! Per-route filter chain.
//!
//! # Data Flow
//! ```text
//! Matched route + request
//!     → chain.rs (resolve filter ids in declared order)
//!     → logging.rs / auth.rs / refresh_cookie.rs (request hooks)
//!     → Continue: next filter, finally the forwarder
//!     → Respond: short-circuit with the filter's response
//!     → completion hooks in reverse order for entered filters
//! ```

pub mod auth;
pub mod chain;
pub mod logging;
pub mod refresh_cookie;

use axum::{body::Body, http::Request, response::Response};

use crate::http::request::RequestContext;
use crate::routing::Route;

pub use chain::FilterChain;

/// Result of a request hook.
pub enum FilterAction {
    /// Pass the (possibly rewritten) request on.
    Continue(Request<Body>),
    /// Stop here and answer with this response.
    Respond(Response),
}

/// A unit of per-route request processing.
pub trait GatewayFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_request(&self, ctx: &RequestContext, route: &Route, request: Request<Body>) -> FilterAction;

    /// Called once the response is known, for every filter whose request
    /// hook ran.
    fn on_response(&self, _ctx: &RequestContext, _route: &Route, _response: &Response) {}
}
