//! Request facade over the transport's inbound request.
//!
//! # Responsibilities
//! - Expose URI, method, headers and parameters as plain strings
//! - Read the body lazily, once, with a size limit
//! - Surface the request-scoped cancellation/deadline context
//! - Keep the native `http::request::Parts` reachable behind a downcast
//!
//! # Design Decisions
//! - Absent headers and parameters read as `""`, never as errors
//! - Query-string parameters win over route placeholders of the same name
//! - A failed body read yields an error and no bytes, never partial data

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::Request;
use axum::http::request::Parts;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::http::bind::ExtractBindParamFn;
use crate::http::error::BodyError;

/// Default cap on buffered request bodies (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Cancellation and deadline signals scoped to one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// Same cancellation token, deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the request is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Resolves once the request is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

/// Read-only view over an inbound request.
#[async_trait]
pub trait RequestSource: Send + Sync {
    /// Request target as received.
    fn uri(&self) -> &str;

    /// HTTP verb, upper case.
    fn method(&self) -> &str;

    /// Header value by name, `""` when absent.
    fn header(&self, name: &str) -> &str;

    /// Query-string parameter, else bind parameter, else `""`.
    fn param(&self, name: &str) -> String;

    /// Full request body.
    ///
    /// On failure no bytes are returned alongside the error.
    async fn body(&self) -> Result<Bytes, BodyError>;

    /// Request-scoped cancellation/deadline context.
    fn context(&self) -> &RequestContext;

    /// Underlying transport object. Prefer the typed `native::<T>()` accessor.
    fn request(&self) -> &dyn Any;
}

impl dyn RequestSource {
    /// Typed access to the native transport object, if it is a `T`.
    pub fn native<T: Any>(&self) -> Option<&T> {
        self.request().downcast_ref::<T>()
    }
}

/// Shared handle to a request facade, as handed to handlers.
pub type SharedRequest = Arc<dyn RequestSource>;

enum BodyState {
    Unread(Body),
    Buffered(Bytes),
    Failed,
}

/// [`RequestSource`] backed by an axum request.
pub struct DefaultRequestSource {
    parts: Parts,
    uri: String,
    method: String,
    query: Vec<(String, String)>,
    body: Mutex<BodyState>,
    body_limit: usize,
    context: RequestContext,
    extract: ExtractBindParamFn,
}

impl DefaultRequestSource {
    pub fn new(request: Request<Body>, extract: ExtractBindParamFn) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body, extract)
    }

    pub fn from_parts(parts: Parts, body: Body, extract: ExtractBindParamFn) -> Self {
        // Nested routers strip their prefix from `parts.uri`; report what the client sent.
        let target = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);

        let uri = target.to_string();
        let query = target
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        let method = parts.method.as_str().to_ascii_uppercase();

        Self {
            parts,
            uri,
            method,
            query,
            body: Mutex::new(BodyState::Unread(body)),
            body_limit: DEFAULT_BODY_LIMIT,
            context: RequestContext::background(),
            extract,
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn into_shared(self) -> SharedRequest {
        Arc::new(self)
    }
}

#[async_trait]
impl RequestSource for DefaultRequestSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn header(&self, name: &str) -> &str {
        self.parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    fn param(&self, name: &str) -> String {
        if let Some((_, v)) = self.query.iter().find(|(k, _)| k == name) {
            if !v.is_empty() {
                return v.clone();
            }
        }
        let bound = (self.extract)(&self.parts, name);
        if !bound.is_empty() {
            return bound;
        }
        String::new()
    }

    async fn body(&self) -> Result<Bytes, BodyError> {
        let mut state = self.body.lock().await;
        match std::mem::replace(&mut *state, BodyState::Failed) {
            BodyState::Unread(body) => match axum::body::to_bytes(body, self.body_limit).await {
                Ok(bytes) => {
                    *state = BodyState::Buffered(bytes.clone());
                    Ok(bytes)
                }
                Err(err) => {
                    tracing::debug!(uri = %self.uri, error = %err, "Request body read failed");
                    Err(BodyError::read(err))
                }
            },
            BodyState::Buffered(bytes) => {
                *state = BodyState::Buffered(bytes.clone());
                Ok(bytes)
            }
            BodyState::Failed => Err(BodyError::Unavailable),
        }
    }

    fn context(&self) -> &RequestContext {
        &self.context
    }

    fn request(&self) -> &dyn Any {
        &self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::bind::{BoundParams, no_bind_params, route_params};
    use axum::http::{Method, Uri};

    fn facade(request: Request<Body>) -> SharedRequest {
        DefaultRequestSource::new(request, route_params()).into_shared()
    }

    fn with_bound(mut request: Request<Body>, params: &[(&str, &str)]) -> Request<Body> {
        let mut bound = BoundParams::new();
        for (k, v) in params {
            bound.insert(*k, *v);
        }
        request.extensions_mut().insert(bound);
        request
    }

    #[test]
    fn test_uri_and_method() {
        let req = Request::builder()
            .method(Method::from_bytes(b"purge").unwrap())
            .uri("/cache/items?id=7")
            .body(Body::empty())
            .unwrap();
        let req = facade(req);
        assert_eq!(req.uri(), "/cache/items?id=7");
        assert_eq!(req.method(), "PURGE");
    }

    #[test]
    fn test_original_uri_preferred() {
        let mut req = Request::builder().uri("/inner").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(OriginalUri(Uri::from_static("/api/inner?x=1")));
        let req = facade(req);
        assert_eq!(req.uri(), "/api/inner?x=1");
        assert_eq!(req.param("x"), "1");
    }

    #[test]
    fn test_missing_header_is_empty() {
        let req = Request::builder()
            .header("X-Present", "yes")
            .header("X-Present", "again")
            .body(Body::empty())
            .unwrap();
        let req = facade(req);
        assert_eq!(req.header("X-Present"), "yes");
        assert_eq!(req.header("X-Absent"), "");
        assert_eq!(req.header("not a header name"), "");
    }

    #[test]
    fn test_query_param_wins_over_bind_param() {
        let req = Request::builder()
            .uri("/users/42?id=7&name=J%C3%BCrgen")
            .body(Body::empty())
            .unwrap();
        let req = facade(with_bound(req, &[("id", "42"), ("group", "admins")]));
        assert_eq!(req.param("id"), "7");
        assert_eq!(req.param("name"), "Jürgen");
        assert_eq!(req.param("group"), "admins");
        assert_eq!(req.param("missing"), "");
    }

    #[test]
    fn test_empty_query_value_falls_through() {
        let req = Request::builder().uri("/users/42?id=").body(Body::empty()).unwrap();
        let req = facade(with_bound(req, &[("id", "42")]));
        assert_eq!(req.param("id"), "42");
    }

    #[tokio::test]
    async fn test_body_is_read_once_and_cached() {
        let req = Request::builder().body(Body::from("payload")).unwrap();
        let req = facade(req);
        assert_eq!(req.body().await.unwrap(), Bytes::from("payload"));
        assert_eq!(req.body().await.unwrap(), Bytes::from("payload"));
    }

    #[tokio::test]
    async fn test_empty_body_is_not_an_error() {
        let req = facade(Request::new(Body::empty()));
        assert!(req.body().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_stream_yields_error_without_bytes() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from("partial")),
            Err(std::io::Error::other("disk on fire")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));
        let req = facade(Request::new(body));

        let err = req.body().await.unwrap_err();
        assert!(matches!(err, BodyError::Read { .. }));
        assert!(matches!(req.body().await.unwrap_err(), BodyError::Unavailable));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let req = DefaultRequestSource::new(Request::new(Body::from("0123456789")), no_bind_params())
            .with_body_limit(4)
            .into_shared();
        assert!(matches!(req.body().await, Err(BodyError::Read { .. })));
    }

    #[test]
    fn test_native_downcast() {
        let req = facade(Request::builder().uri("/native").body(Body::empty()).unwrap());
        let parts = req.native::<Parts>().expect("parts");
        assert_eq!(parts.uri.path(), "/native");
        assert!(req.native::<String>().is_none());
    }

    #[tokio::test]
    async fn test_context_propagated() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new(token.clone(), None).with_timeout(Duration::from_secs(30));
        let req = DefaultRequestSource::new(Request::new(Body::empty()), no_bind_params())
            .with_context(ctx)
            .into_shared();

        assert!(req.context().deadline().is_some());
        assert!(!req.context().is_cancelled());
        token.cancel();
        assert!(req.context().is_cancelled());
        req.context().done().await;
    }

    #[tokio::test]
    async fn test_done_on_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));
        ctx.done().await;
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert!(!ctx.is_cancelled());
    }
}
