//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Client, Response};
use session_gate::config::{GateConfig, UserConfig};
use session_gate::{HttpServer, Shutdown};
use tokio::sync::mpsc;

pub const PASSWORD: &str = "wonderland";

/// A gate running on an ephemeral loopback port.
pub struct TestGate {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<GateConfig>,
    pub cookie_name: String,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn config_with_users(names: &[&str]) -> GateConfig {
    let mut config = GateConfig::default();
    config.users = names
        .iter()
        .map(|name| UserConfig {
            username: name.to_string(),
            password: PASSWORD.to_string(),
        })
        .collect();
    config
}

/// Start the gate and wait until it accepts connections.
pub async fn start_gate(config: GateConfig) -> TestGate {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cookie_name = config.session.cookie_name.clone();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGate {
        addr,
        shutdown,
        config_updates,
        cookie_name,
    }
}

/// A client that never follows redirects and keeps no cookie jar, so every
/// test controls exactly which session token it presents.
pub fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub async fn login(client: &Client, gate: &TestGate, username: &str, password: &str) -> Response {
    client
        .post(gate.url("/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .expect("gate unreachable")
}

/// Log in and return the issued session token.
pub async fn login_token(client: &Client, gate: &TestGate, username: &str) -> String {
    let res = login(client, gate, username, PASSWORD).await;
    assert_eq!(res.status(), 302);
    assert_eq!(location(&res), "/");
    session_token(&res, &gate.cookie_name).expect("login did not set a session cookie")
}

pub async fn get_with_token(client: &Client, gate: &TestGate, path: &str, token: &str) -> Response {
    client
        .get(gate.url(path))
        .header(COOKIE, format!("{}={}", gate.cookie_name, token))
        .send()
        .await
        .expect("gate unreachable")
}

pub fn location(res: &Response) -> &str {
    res.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// The token value from a `Set-Cookie` for `name`; `Some("")` when cleared.
pub fn session_token(res: &Response, name: &str) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
