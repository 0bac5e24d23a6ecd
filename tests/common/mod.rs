//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::post, Router};
use range_proxy::config::ProxyConfig;
use range_proxy::http::HttpServer;
use range_proxy::lifecycle::Shutdown;
use range_proxy::resilience::TimeoutTier;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub const ENDPOINT: &str = "/api/huacore.forms/documentapi/getvalue";
pub const BACKEND_PATH: &str = "/internal/getvalue";

/// Bodies the mock backend received, in arrival order.
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<Value>>>);

impl Received {
    pub fn bodies(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

#[derive(Clone)]
struct MockState {
    received: Received,
    status: StatusCode,
    body: &'static str,
}

/// Start an axum backend that records every JSON body and answers with a
/// fixed status and raw body.
pub async fn start_mock_backend(status: u16, body: &'static str) -> (SocketAddr, Received) {
    let received = Received::default();
    let state = MockState {
        received: received.clone(),
        status: StatusCode::from_u16(status).unwrap(),
        body,
    };

    let app = Router::new()
        .route(
            BACKEND_PATH,
            post(|State(s): State<MockState>, body: String| async move {
                let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
                s.received.0.lock().unwrap().push(value);
                (s.status, s.body)
            }),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, received)
}

/// Start a backend that accepts connections and never answers.
/// Returns the address and a counter of accepted connections.
pub async fn start_silent_backend() -> (SocketAddr, Arc<Mutex<usize>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(Mutex::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            *counter.lock().unwrap() += 1;
            held.push(socket);
        }
    });

    (addr, accepted)
}

/// Start a backend that writes a raw, non-JSON HTTP response.
pub async fn start_raw_backend(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address with nothing listening on it.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Proxy config pointing at `backend`.
pub fn proxy_config(backend: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.url = format!("http://{}{}", backend, BACKEND_PATH);
    config.backend.connect_timeout_secs = 2;
    config
}

/// Tier table with one-second deadlines so timeout tests stay fast.
pub fn fast_tiers() -> Vec<TimeoutTier> {
    vec![TimeoutTier::up_to(24, 1), TimeoutTier::catch_all(2)]
}

/// A running proxy. Shuts down when dropped.
pub struct TestProxy {
    pub url: String,
    shutdown: Shutdown,
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let server = HttpServer::new(config).expect("valid test config");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    // The listener is already bound; give the serve loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestProxy {
        url: format!("http://{}{}", addr, ENDPOINT),
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
