//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::net::TcpListener;

use edge_gateway::auth::{Claims, TokenValidator};
use edge_gateway::config::{parse_config, validation::validate_config, GatewayConfig};
use edge_gateway::{GatewayServer, Shutdown};

pub const SECRET: &str = "integration-test-secret-key";

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Seen {
    async fn capture(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method.to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body: to_bytes(body, usize::MAX).await.unwrap_or_default(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockBackend {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.seen().pop().expect("backend received no request")
    }
}

/// Start a backend answering 200 with a small JSON body on every path.
pub async fn start_mock_backend(name: &'static str) -> MockBackend {
    start_programmable_backend(move |_| async move { (200, format!("{{\"service\":\"{}\"}}", name)) }).await
}

/// Start a backend whose status and body come from `f(hit_number)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let hits = Arc::new(AtomicU32::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let app = {
        let hits = hits.clone();
        let seen = seen.clone();
        Router::new().fallback(move |request: Request<Body>| {
            let f = f.clone();
            let hits = hits.clone();
            let seen = seen.clone();
            async move {
                let n = hits.fetch_add(1, Ordering::SeqCst);
                let captured = Seen::capture(request).await;
                seen.lock().unwrap().push(captured);
                let (status, body) = f(n).await;
                (StatusCode::from_u16(status).unwrap(), body)
            }
        })
    };

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, hits, seen }
}

/// An address with nothing listening on it.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Validated config with the given services and extra TOML (routes).
pub fn gateway_config(services: &[(&str, SocketAddr)], routes: &str) -> GatewayConfig {
    let mut toml = format!(
        r#"
        [auth]
        jwt_secret = "{SECRET}"
        excluded_paths = ["/user/login"]

        [health_check]
        enabled = false
        timeout_ms = 500

        [retries]
        backoff_ms = 10

        [observability]
        metrics_enabled = false
        "#
    );
    for (name, addr) in services {
        toml.push_str(&format!(
            "\n[[services]]\nname = \"{}\"\nurl = \"http://{}\"\n",
            name, addr
        ));
    }
    toml.push_str(routes);

    let config = parse_config(&toml).unwrap();
    validate_config(&config).unwrap();
    config
}

/// A running gateway; shuts down on drop.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let validator = TokenValidator::new(&config.auth.jwt_secret).unwrap();
    let server = GatewayServer::new(config, validator).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn mint_token(id: i64, role: &str, exp_offset_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        id,
        role: role.to_string(),
        iat: now,
        exp: now + exp_offset_secs,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}
