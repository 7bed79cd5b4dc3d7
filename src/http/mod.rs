//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers, request ID)
//!     → endpoint.rs (bridge: raw request → facade → handler)
//!     → filter.rs (optional filters, panic recovery)
//!     → handler logic (reads request.rs facade, builds response.rs model)
//!     → response.rs (written onto the transport sink)
//!     → Send to client
//! ```

pub mod bind;
pub mod endpoint;
pub mod error;
pub mod filter;
pub mod request;
pub mod response;
pub mod server;

pub use bind::{BoundParams, ExtractBindParamFn, bind_param_fn, no_bind_params, route_params};
pub use endpoint::{BridgeOptions, RequestHandler, create_handler, create_handler_with};
pub use error::{BodyError, WriteError};
pub use filter::{
    EndpointFilter, Filtered, HandlerExt, PanicRecovery, PanicValue, add_panic_recovery,
    default_recovery,
};
pub use request::{DefaultRequestSource, RequestContext, RequestSource, SharedRequest};
pub use response::{
    BoxResponse, BufferedResponseWriter, HttpResponse, IntoResponseSource, ResponseSource,
    ResponseWriter,
};
pub use server::{HttpServer, X_REQUEST_ID};
