//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use billing_mesh::config::{AppConfig, InstanceConfig};
use billing_mesh::http::EdgeServer;
use billing_mesh::lifecycle::{build_billing, Shutdown};
use billing_mesh::upstream::{self, UpstreamKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

async fn ephemeral() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing listens on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn instance(name: &str, service: &str, addr: SocketAddr) -> InstanceConfig {
    InstanceConfig {
        name: name.into(),
        service: service.into(),
        address: addr.to_string(),
        max_connections: 100,
    }
}

/// Defaults with the customer and inventory services at the given addresses.
pub fn mesh_config(customers: SocketAddr, products: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.instances = vec![
        instance("customer-1", "customer-service", customers),
        instance("inventory-1", "inventory-service", products),
    ];
    config.timeouts.lookup_ms = 500;
    config.timeouts.forward_secs = 2;
    config
}

/// Start a fixture upstream serving the demo catalog.
pub async fn spawn_upstream(kind: UpstreamKind, shutdown: &Shutdown) -> SocketAddr {
    let (listener, addr) = ephemeral().await;
    tokio::spawn(upstream::serve(kind.router(), listener, shutdown.subscribe()));
    addr
}

/// Start a billing service built from `config`.
pub async fn spawn_billing(config: &AppConfig, shutdown: &Shutdown) -> SocketAddr {
    let stack = build_billing(config).await.unwrap();
    let (listener, addr) = ephemeral().await;
    tokio::spawn(stack.server.run(listener, shutdown.subscribe()));
    addr
}

/// Start an edge router built from `config`.
pub async fn spawn_edge(config: &AppConfig, shutdown: &Shutdown) -> SocketAddr {
    let server = EdgeServer::new(config);
    let (listener, addr) = ephemeral().await;
    tokio::spawn(server.run(listener, None, shutdown.subscribe()));
    addr
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let (listener, addr) = ephemeral().await;
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
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

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
