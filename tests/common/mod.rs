//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use rester::config::{AddressConfig, Protocol};
use rester::{HttpServer, Rester, ResterConfig, Shutdown};
use tower::ServiceExt;

/// Configuration listening on one ephemeral loopback port.
pub fn local_config() -> ResterConfig {
    ResterConfig {
        addresses: vec![AddressConfig {
            host: "127.0.0.1".into(),
            port: 0,
            protocol: Protocol::Http,
        }],
        ..ResterConfig::default()
    }
}

/// In-process server wrapping the pool built from `app`.
pub fn in_process(app: &Rester) -> HttpServer {
    let pool = app.build().unwrap();
    HttpServer::new(Arc::new(pool), app.config())
}

/// Send one request through the full middleware stack without a socket.
pub async fn send(server: &HttpServer, method: Method, uri: &str, body: Body) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    server.router().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start `app` on real sockets; returns the shutdown trigger and bound addresses.
pub async fn start(app: Rester) -> (Shutdown, Vec<SocketAddr>, tokio::task::JoinHandle<()>) {
    let shutdown = Shutdown::new();
    let running = app.start(&shutdown).await.unwrap();
    let addrs = running.local_addrs().to_vec();
    let handle = tokio::spawn(async move {
        let _ = running.wait().await;
    });
    (shutdown, addrs, handle)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
