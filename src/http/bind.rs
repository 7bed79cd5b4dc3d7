//! Bind-parameter extraction.
//!
//! Route placeholders (`/users/{id}`) are owned by the transport's router.
//! The facade only asks an extractor function for a value by name, so the
//! knowledge of placeholder names stays with whoever registered the route.

use std::sync::Arc;

use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;

/// Looks up a bind parameter on the raw request.
///
/// Implementations must return `""` for unknown names and never fail.
pub type ExtractBindParamFn = Arc<dyn Fn(&Parts, &str) -> String + Send + Sync>;

/// Route placeholders captured by the bridge before the handler runs.
///
/// Stored in the request extensions so extractors can read them from
/// `&Parts` without touching axum's private state.
#[derive(Debug, Clone, Default)]
pub struct BoundParams {
    params: Vec<(String, String)>,
}

impl BoundParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Capture axum's path parameters into a [`BoundParams`] extension.
///
/// A request that did not go through a parameterized route gets an empty set.
pub(crate) async fn capture_route_params(parts: &mut Parts) {
    if parts.extensions.get::<BoundParams>().is_some() {
        return;
    }

    let mut bound = BoundParams::new();
    if let Ok(raw) = RawPathParams::from_request_parts(parts, &()).await {
        for (name, value) in raw.iter() {
            bound.insert(name, value);
        }
    }
    parts.extensions.insert(bound);
}

/// Extractor reading the route placeholders captured by the bridge.
pub fn route_params() -> ExtractBindParamFn {
    Arc::new(|parts: &Parts, name: &str| {
        parts
            .extensions
            .get::<BoundParams>()
            .and_then(|params| params.get(name))
            .unwrap_or_default()
            .to_string()
    })
}

/// Extractor for routes without placeholders.
pub fn no_bind_params() -> ExtractBindParamFn {
    Arc::new(|_: &Parts, _: &str| String::new())
}

/// Wrap a plain function or closure as an [`ExtractBindParamFn`].
pub fn bind_param_fn<F>(f: F) -> ExtractBindParamFn
where
    F: Fn(&Parts, &str) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(params: &[(&str, &str)]) -> Parts {
        let (mut parts, _) = Request::builder().uri("/users/42").body(()).unwrap().into_parts();
        let mut bound = BoundParams::new();
        for (k, v) in params {
            bound.insert(*k, *v);
        }
        parts.extensions.insert(bound);
        parts
    }

    #[test]
    fn test_route_params_lookup() {
        let parts = parts_with(&[("id", "42")]);
        let extract = route_params();
        assert_eq!(extract(&parts, "id"), "42");
        assert_eq!(extract(&parts, "missing"), "");
    }

    #[test]
    fn test_route_params_without_extension() {
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(route_params()(&parts, "id"), "");
    }

    #[test]
    fn test_no_bind_params() {
        let parts = parts_with(&[("id", "42")]);
        assert_eq!(no_bind_params()(&parts, "id"), "");
    }

    #[test]
    fn test_bind_param_fn_reads_path() {
        let extract = bind_param_fn(|parts, name| {
            if name == "tail" {
                parts.uri.path().rsplit('/').next().unwrap_or_default().to_string()
            } else {
                String::new()
            }
        });
        let parts = parts_with(&[]);
        assert_eq!(extract(&parts, "tail"), "42");
        assert_eq!(extract(&parts, "head"), "");
    }

    #[tokio::test]
    async fn test_capture_without_route_is_empty() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        capture_route_params(&mut parts).await;
        assert!(parts.extensions.get::<BoundParams>().unwrap().is_empty());
    }
}
