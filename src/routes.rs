//! Demo endpoints served by the `endpoint-bridge` binary.
//!
//! Each route is a plain [`RequestHandler`] mounted through the bridge, so
//! this module doubles as a worked example of the handler API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{any, get};
use serde::Serialize;

use crate::config::{PropertyError, PropertySource};
use crate::http::{
    BridgeOptions, EndpointFilter, HandlerExt, HttpResponse, PanicValue, RequestHandler,
    SharedRequest, X_REQUEST_ID, create_handler_with, default_recovery, no_bind_params,
    route_params,
};
use crate::observability::Logger;

/// Assemble the demo routes.
pub fn build_routes(
    options: BridgeOptions,
    properties: Arc<dyn PropertySource>,
    logger: Arc<dyn Logger>,
) -> Router {
    let echo = echo
        .with_panic_recovery(default_recovery(logger.clone()))
        .with_filter(access_log(logger.clone()));

    let settings = {
        let properties = properties.clone();
        move |req: SharedRequest| {
            let properties = properties.clone();
            async move { show_setting(properties.as_ref(), &req.param("key")) }
        }
    }
    .with_panic_recovery(default_recovery(logger.clone()));

    let explode = explode.with_panic_recovery(|value: PanicValue| {
        HttpResponse::text(500, value.to_string())
    });

    Router::new()
        .route("/health", get(create_handler_with(health, no_bind_params(), options.clone())))
        .route("/echo", any(create_handler_with(echo, no_bind_params(), options.clone())))
        .route("/users/{id}", get(create_handler_with(show_user, route_params(), options.clone())))
        .route("/panic", get(create_handler_with(explode, no_bind_params(), options.clone())))
        .route("/settings/{key}", get(create_handler_with(settings, route_params(), options)))
}

/// Logs one line per request once the wrapped handler has answered.
fn access_log(logger: Arc<dyn Logger>) -> impl EndpointFilter {
    move |req: SharedRequest, next: Arc<dyn RequestHandler>| {
        let logger = logger.clone();
        async move {
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let response = next.handle(req).await;
            crate::log_info!(logger, "{method} {uri} -> {}", response.status());
            response
        }
    }
}

async fn health(_req: SharedRequest) -> HttpResponse {
    HttpResponse::text(200, "ok")
}

#[derive(Serialize)]
struct Echo<'a> {
    method: &'a str,
    uri: &'a str,
    request_id: &'a str,
    content_type: &'a str,
    body: String,
}

async fn echo(req: SharedRequest) -> HttpResponse {
    let body = match req.body().await {
        Ok(body) => body,
        Err(e) => panic!("reading request body: {e}"),
    };

    let echo = Echo {
        method: req.method(),
        uri: req.uri(),
        request_id: req.header(X_REQUEST_ID),
        content_type: req.header("content-type"),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    match HttpResponse::json(200, &echo) {
        Ok(response) => response,
        Err(e) => panic!("encoding echo: {e}"),
    }
}

/// `?id=` on the query string wins over the path placeholder.
async fn show_user(req: SharedRequest) -> HttpResponse {
    let id = req.param("id");
    if id.is_empty() {
        return HttpResponse::text(400, "missing user id");
    }
    HttpResponse::text(200, format!("user {id}"))
}

async fn explode(req: SharedRequest) -> HttpResponse {
    let message = req.param("message");
    if message.is_empty() {
        panic!("boom");
    }
    panic!("{message}");
}

fn show_setting(properties: &dyn PropertySource, key: &str) -> HttpResponse {
    let Some(value) = properties.get(key) else {
        return HttpResponse::text(404, PropertyError::Missing(key.to_string()).to_string());
    };
    match HttpResponse::json(200, value) {
        Ok(response) => response,
        Err(e) => panic!("encoding property {key}: {e}"),
    }
}
