//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use endpoint_bridge::config::{ServerConfig, TomlPropertySource};
use endpoint_bridge::http::{BridgeOptions, HttpServer};
use endpoint_bridge::lifecycle::Shutdown;
use endpoint_bridge::observability::ConsoleLogger;
use endpoint_bridge::routes::build_routes;

pub const PROPERTIES: &str = r#"
greeting = "hello"

[database]
pool_size = 16
replicas = ["a", "b"]
"#;

/// Demo routes mounted in a fully layered server, plus the logger they write to.
pub fn demo_app(config: ServerConfig) -> (HttpServer, Arc<ConsoleLogger<Vec<u8>>>) {
    let logger = Arc::new(ConsoleLogger::new(Vec::new()));
    let properties = Arc::new(TomlPropertySource::parse(PROPERTIES).unwrap());
    let routes = build_routes(BridgeOptions::from_config(&config), properties, logger.clone());
    (HttpServer::new(config, routes), logger)
}

/// A running server on an ephemeral port.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

#[allow(dead_code)]
pub async fn spawn_server(server: HttpServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    RunningServer { addr, shutdown, handle }
}

#[allow(dead_code)]
pub fn router(server: HttpServer) -> Router {
    server.into_router()
}

#[allow(dead_code)]
pub async fn read_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
