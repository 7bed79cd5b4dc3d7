//! Endpoint filters and the panic-recovery boundary.
//!
//! # Responsibilities
//! - Wrap a handler with behavior that runs before/after it
//! - Catch handler panics and turn them into a response
//!
//! # Design Decisions
//! - One recovery boundary per call chain; stacked boundaries resolve
//!   innermost first, so an outer one only sees panics the inner one lets out
//! - A panic raised by the recovery function itself is not caught again
//! - Requires `panic = "unwind"`; with `abort` there is nothing to catch

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::http::endpoint::RequestHandler;
use crate::http::request::SharedRequest;
use crate::http::response::{BoxResponse, HttpResponse, IntoResponseSource};
use crate::observability::logging::Logger;
use crate::observability::metrics;

/// An endpoint filter.
///
/// Chooses whether and when to invoke `next`, and may act on the request
/// before and on the response after.
pub trait EndpointFilter: Send + Sync + 'static {
    fn filter(&self, req: SharedRequest, next: Arc<dyn RequestHandler>) -> BoxFuture<'static, BoxResponse>;
}

impl<F, Fut> EndpointFilter for F
where
    F: Fn(SharedRequest, Arc<dyn RequestHandler>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = BoxResponse> + Send + 'static,
{
    fn filter(&self, req: SharedRequest, next: Arc<dyn RequestHandler>) -> BoxFuture<'static, BoxResponse> {
        Box::pin(self(req, next))
    }
}

/// A handler with a filter applied in front of it.
pub struct Filtered<F> {
    filter: F,
    next: Arc<dyn RequestHandler>,
}

impl<F: EndpointFilter> Filtered<F> {
    pub fn new<H: RequestHandler>(filter: F, handler: H) -> Self {
        Self {
            filter,
            next: Arc::new(handler),
        }
    }
}

impl<F: EndpointFilter> RequestHandler for Filtered<F> {
    fn handle(&self, req: SharedRequest) -> BoxFuture<'static, BoxResponse> {
        self.filter.filter(req, self.next.clone())
    }
}

/// Composition helpers available on every handler.
pub trait HandlerExt: RequestHandler + Sized {
    fn with_filter<F: EndpointFilter>(self, filter: F) -> Filtered<F> {
        Filtered::new(filter, self)
    }

    fn with_panic_recovery<R, Resp>(self, recover: R) -> Filtered<PanicRecovery>
    where
        R: Fn(PanicValue) -> Resp + Send + Sync + 'static,
        Resp: IntoResponseSource,
    {
        add_panic_recovery(self, recover)
    }
}

impl<H: RequestHandler> HandlerExt for H {}

/// Payload captured from a handler panic.
pub struct PanicValue(Box<dyn Any + Send>);

impl PanicValue {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self(payload)
    }

    /// The panic message, when the payload is a `&str` or `String`.
    pub fn message(&self) -> Option<&str> {
        self.0
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.0.downcast_ref::<String>().map(String::as_str))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.0
    }

    /// Continue unwinding with the original payload.
    pub fn resume(self) -> ! {
        std::panic::resume_unwind(self.0)
    }
}

impl fmt::Display for PanicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("non-string panic payload"))
    }
}

impl fmt::Debug for PanicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PanicValue").field(&self.message()).finish()
    }
}

type RecoverFn = Arc<dyn Fn(PanicValue) -> BoxResponse + Send + Sync>;

/// Filter that maps handler panics to a response.
#[derive(Clone)]
pub struct PanicRecovery {
    recover: RecoverFn,
}

impl PanicRecovery {
    pub fn new<R, Resp>(recover: R) -> Self
    where
        R: Fn(PanicValue) -> Resp + Send + Sync + 'static,
        Resp: IntoResponseSource,
    {
        Self {
            recover: Arc::new(move |value| recover(value).into_response_source()),
        }
    }
}

impl EndpointFilter for PanicRecovery {
    fn filter(&self, req: SharedRequest, next: Arc<dyn RequestHandler>) -> BoxFuture<'static, BoxResponse> {
        let recover = self.recover.clone();
        Box::pin(async move {
            // A handler may panic while building its future, not only while polling it.
            let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| next.handle(req))) {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(payload) => Err(payload),
            };

            match outcome {
                Ok(response) => response,
                Err(payload) => {
                    metrics::record_panic_recovered();
                    recover(PanicValue::new(payload))
                }
            }
        })
    }
}

/// Wrap `handler` so that any panic it raises is passed to `recover` and
/// the response `recover` builds is returned in its place.
pub fn add_panic_recovery<H, R, Resp>(handler: H, recover: R) -> Filtered<PanicRecovery>
where
    H: RequestHandler,
    R: Fn(PanicValue) -> Resp + Send + Sync + 'static,
    Resp: IntoResponseSource,
{
    Filtered::new(PanicRecovery::new(recover), handler)
}

/// Recovery function that logs the panic and answers `500`.
pub fn default_recovery(logger: Arc<dyn Logger>) -> impl Fn(PanicValue) -> HttpResponse + Send + Sync + 'static {
    move |value: PanicValue| {
        logger.error(format_args!("handler panicked: {value}"));
        HttpResponse::text(500, "Internal Server Error")
    }
}
