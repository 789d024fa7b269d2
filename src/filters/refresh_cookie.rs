//! Refresh-token cookie to header propagation.
//!
//! Copies the value of the configured cookie into the configured request
//! header so the user-service can read it without parsing cookies. A request
//! without the cookie passes through unchanged.

use axum::{
    body::Body,
    http::{
        header::{self, InvalidHeaderName},
        HeaderMap, HeaderName, HeaderValue, Request,
    },
};

use crate::filters::{FilterAction, GatewayFilter};
use crate::http::request::RequestContext;
use crate::routing::Route;

pub struct RefreshCookieFilter {
    cookie: String,
    header: HeaderName,
}

impl RefreshCookieFilter {
    pub fn new(cookie: &str, header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            cookie: cookie.to_string(),
            header: HeaderName::from_bytes(header.as_bytes())?,
        })
    }
}

impl GatewayFilter for RefreshCookieFilter {
    fn name(&self) -> &'static str {
        "refresh-token-cookie"
    }

    fn on_request(&self, ctx: &RequestContext, _route: &Route, mut request: Request<Body>) -> FilterAction {
        let value = cookie_value(request.headers(), &self.cookie).map(HeaderValue::from_str);

        match value {
            Some(Ok(value)) => {
                request.headers_mut().insert(self.header.clone(), value);
            }
            Some(Err(_)) => {
                tracing::warn!(request_id = %ctx.request_id, cookie = %self.cookie, "Cookie value is not a valid header value");
            }
            None => {}
        }
        FilterAction::Continue(request)
    }
}

/// Value of the first cookie named `name` across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}
