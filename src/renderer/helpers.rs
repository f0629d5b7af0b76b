//! URL helpers injected into the view context

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

/// Characters escaped in a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// URL-building capability handed to templates through the view context
pub trait UrlHelpers: Send + Sync {
    /// Build the URL for a named route, or `None` if the route is unknown
    fn url_for(&self, name: &str, params: &[Value]) -> Option<String>;
}

/// Helpers for hosts without routing; every lookup fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRoutes;

impl UrlHelpers for NoRoutes {
    fn url_for(&self, _name: &str, _params: &[Value]) -> Option<String> {
        None
    }
}

/// Named route table with `:param` placeholders
///
/// Parameters fill placeholders in order and are percent-encoded. A route
/// given too few or too many parameters does not resolve.
///
/// # Example
///
/// ```rust
/// use view_components::{Routes, UrlHelpers};
/// use serde_json::json;
///
/// let routes = Routes::new().route("issue", "/issues/:id");
/// assert_eq!(routes.url_for("issue", &[json!(42)]).as_deref(), Some("/issues/42"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Routes {
    patterns: HashMap<String, String>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named route
    pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.patterns.insert(name.into(), pattern.into());
        self
    }
}

impl UrlHelpers for Routes {
    fn url_for(&self, name: &str, params: &[Value]) -> Option<String> {
        let pattern = self.patterns.get(name)?;
        let mut params = params.iter();

        let segments: Vec<String> = pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(_) => params.next().map(param_segment),
                None => Some(segment.to_string()),
            })
            .collect::<Option<_>>()?;

        if params.next().is_some() {
            return None;
        }
        Some(segments.join("/"))
    }
}

fn param_segment(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    utf8_percent_encode(&text, SEGMENT).to_string()
}
