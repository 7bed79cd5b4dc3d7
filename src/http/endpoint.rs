//! Endpoint handlers and the bridge onto axum.
//!
//! # Data Flow
//! ```text
//! axum route
//!     → create_handler closure
//!     → DefaultRequestSource (facade over the raw request)
//!     → RequestHandler (optionally wrapped by filters)
//!     → ResponseSource::write onto BufferedResponseWriter
//!     → http::Response back to hyper
//! ```
//!
//! # Design Decisions
//! - Handlers take one input and return one output; failures are panics
//! - The bridge adds no retries and no recovery of its own
//! - An unwrapped handler panic unwinds into hyper's connection task

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::http::bind::{ExtractBindParamFn, capture_route_params};
use crate::http::request::{DEFAULT_BODY_LIMIT, DefaultRequestSource, RequestContext, RequestSource, SharedRequest};
use crate::http::response::{BoxResponse, BufferedResponseWriter, IntoResponseSource};
use crate::observability::metrics;

/// An endpoint handler.
///
/// Takes a request facade and returns a response. Handlers are expected to
/// panic on errors they cannot turn into a response themselves and leave the
/// translation to a recovery filter installed around them.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle(&self, req: SharedRequest) -> BoxFuture<'static, BoxResponse>;
}

impl<F, Fut, R> RequestHandler for F
where
    F: Fn(SharedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponseSource + 'static,
{
    fn handle(&self, req: SharedRequest) -> BoxFuture<'static, BoxResponse> {
        let fut = self(req);
        Box::pin(async move { fut.await.into_response_source() })
    }
}

/// Per-bridge settings applied to every request facade it builds.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Maximum buffered body size for `RequestSource::body`.
    pub body_limit: usize,

    /// Deadline attached to the request context, measured from arrival.
    pub request_timeout: Option<Duration>,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            request_timeout: None,
        }
    }
}

impl BridgeOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            body_limit: config.limits.max_body_size,
            request_timeout: Some(Duration::from_secs(config.timeouts.request_secs)),
        }
    }
}

/// Adapt a [`RequestHandler`] into an axum route handler.
///
/// ```rust,ignore
/// let app = Router::new().route("/users/{id}", get(create_handler(show_user, route_params())));
/// ```
pub fn create_handler<H>(
    handler: H,
    bind_params: ExtractBindParamFn,
) -> impl Fn(Request<Body>) -> BoxFuture<'static, Response<Body>> + Clone + Send + Sync + 'static
where
    H: RequestHandler,
{
    create_handler_with(handler, bind_params, BridgeOptions::default())
}

/// [`create_handler`] with explicit [`BridgeOptions`].
pub fn create_handler_with<H>(
    handler: H,
    bind_params: ExtractBindParamFn,
    options: BridgeOptions,
) -> impl Fn(Request<Body>) -> BoxFuture<'static, Response<Body>> + Clone + Send + Sync + 'static
where
    H: RequestHandler,
{
    let handler: Arc<dyn RequestHandler> = Arc::new(handler);
    let options = Arc::new(options);

    move |request: Request<Body>| -> BoxFuture<'static, Response<Body>> {
        let handler = handler.clone();
        let bind_params = bind_params.clone();
        let options = options.clone();
        Box::pin(async move { dispatch(handler.as_ref(), request, bind_params, &options).await })
    }
}

async fn dispatch(
    handler: &dyn RequestHandler,
    request: Request<Body>,
    bind_params: ExtractBindParamFn,
    options: &BridgeOptions,
) -> Response<Body> {
    let start_time = Instant::now();
    let (mut parts, body) = request.into_parts();
    capture_route_params(&mut parts).await;

    // An outer layer may already have scoped a context to this request.
    let context = match parts.extensions.get::<RequestContext>() {
        Some(ctx) => ctx.clone(),
        None => {
            let ctx = RequestContext::new(CancellationToken::new(), None);
            match options.request_timeout {
                Some(timeout) => ctx.with_timeout(timeout),
                None => ctx,
            }
        }
    };
    // Cancels the context when hyper drops this future or the call returns.
    let _cancel_on_drop = context.cancellation_token().clone().drop_guard();

    let source = DefaultRequestSource::from_parts(parts, body, bind_params)
        .with_context(context)
        .with_body_limit(options.body_limit);
    let method = source.method().to_string();
    let uri = source.uri().to_string();

    tracing::debug!(method = %method, uri = %uri, "Dispatching request");

    let response = handler.handle(source.into_shared()).await;
    let status = response.status();

    let mut writer = BufferedResponseWriter::new();
    let written = response
        .write(&mut writer)
        .and_then(|()| writer.into_response());

    match written {
        Ok(response) => {
            metrics::record_request(&method, status, start_time);
            response
        }
        Err(e) => {
            tracing::error!(method = %method, uri = %uri, status, error = %e, "Failed to write response");
            metrics::record_write_failure();
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
