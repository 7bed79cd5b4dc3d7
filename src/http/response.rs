//! Response model and its serialization onto the transport.
//!
//! # Responsibilities
//! - Hold status, headers and body while handler/filter logic builds them
//! - Write them onto a transport sink exactly once (status, headers, body)
//! - Skip header pairs whose name or value is empty
//!
//! # Design Decisions
//! - `write` takes `Box<Self>`, so a response cannot be written twice
//! - Status is written as-is; an unset status stays `0`
//! - Sink failures are returned to the caller, never rolled back

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode, header};
use bytes::{Bytes, BytesMut};
use serde::Serialize;

use crate::http::error::WriteError;

/// Transport-level sink a response serializes itself onto.
pub trait ResponseWriter {
    /// Write the status line. Called first.
    fn write_status(&mut self, status: u16) -> Result<(), WriteError>;

    /// Set one response header, replacing any previous value.
    fn set_header(&mut self, name: &str, value: &str) -> Result<(), WriteError>;

    /// Append body bytes.
    fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError>;
}

/// Abstract response produced by a handler.
pub trait ResponseSource: Send {
    /// Status code; `0` when never assigned.
    fn status(&self) -> u16;

    /// Header value by name, `""` when unset.
    fn header(&self, name: &str) -> &str;

    /// Body bytes, empty when there is no body.
    fn body(&self) -> &[u8];

    /// Serialize onto the transport sink, consuming the response.
    fn write(self: Box<Self>, w: &mut dyn ResponseWriter) -> Result<(), WriteError>;
}

/// Owned, type-erased response as passed between handlers and filters.
pub type BoxResponse = Box<dyn ResponseSource>;

/// Conversion into a [`BoxResponse`], so handlers can return concrete types.
pub trait IntoResponseSource {
    fn into_response_source(self) -> BoxResponse;
}

impl IntoResponseSource for BoxResponse {
    fn into_response_source(self) -> BoxResponse {
        self
    }
}

impl IntoResponseSource for HttpResponse {
    fn into_response_source(self) -> BoxResponse {
        Box::new(self)
    }
}

/// Default [`ResponseSource`] implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub data: Bytes,
}

impl HttpResponse {
    /// Empty response: status 0, no headers, empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-text response.
    pub fn text(status: u16, body: impl Into<Bytes>) -> Self {
        Self::new()
            .with_status(status)
            .with_header(header::CONTENT_TYPE.as_str(), "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// JSON response from any serializable value.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::new()
            .with_status(status)
            .with_header(header::CONTENT_TYPE.as_str(), "application/json")
            .with_body(body))
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.data = body.into();
        self
    }

    pub fn set_status(&mut self, status: u16) {
        self.status_code = status;
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.data = body.into();
    }
}

impl ResponseSource for HttpResponse {
    fn status(&self) -> u16 {
        self.status_code
    }

    fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or("")
    }

    fn body(&self) -> &[u8] {
        &self.data
    }

    fn write(self: Box<Self>, w: &mut dyn ResponseWriter) -> Result<(), WriteError> {
        w.write_status(self.status_code)?;
        for (name, value) in &self.headers {
            if !name.is_empty() && !value.is_empty() {
                w.set_header(name, value)?;
            }
        }
        w.write_body(&self.data)
    }
}

/// [`ResponseWriter`] that assembles an axum response in memory.
#[derive(Debug, Default)]
pub struct BufferedResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the assembled response to the transport.
    ///
    /// Fails with [`WriteError::InvalidStatus`] if no status was written.
    pub fn into_response(self) -> Result<Response<Body>, WriteError> {
        let status = self.status.ok_or(WriteError::InvalidStatus(0))?;
        let mut response = Response::new(Body::from(self.body.freeze()));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        Ok(response)
    }
}

impl ResponseWriter for BufferedResponseWriter {
    fn write_status(&mut self, status: u16) -> Result<(), WriteError> {
        let code = StatusCode::from_u16(status).map_err(|_| WriteError::InvalidStatus(status))?;
        if let Some(existing) = self.status {
            tracing::warn!(existing = %existing, ignored = status, "Superfluous status write");
            return Ok(());
        }
        self.status = Some(code);
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), WriteError> {
        let invalid = || WriteError::InvalidHeader { name: name.to_string() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> Result<(), WriteError> {
        self.body.extend_from_slice(body);
        Ok(())
    }
}
