//! Endpoint bridge library.
//!
//! Transport-neutral request handlers (`RequestSource` in, `ResponseSource`
//! out), composable filters with panic recovery, and the bridge that mounts
//! them on an axum router.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;

pub use config::ServerConfig;
pub use http::{HttpServer, create_handler};
pub use lifecycle::Shutdown;
