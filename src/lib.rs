//! View Components - reusable, validated markup components
//!
//! A component is a Rust struct paired with one template. The template is
//! either inline or a sidecar file next to the component's source file
//! (`state_badge.rs` and `state_badge.html`). Each component type is compiled
//! once, on first use, by the handler registered for its template kind.
//! Every render captures the caller's block as `content`, checks the
//! component's declared rules, and then runs the compiled template.
//!
//! # Example
//!
//! ```rust
//! use serde::Serialize;
//! use view_components::{Component, Renderer, Rule};
//!
//! #[derive(Serialize)]
//! struct StateBadge {
//!     color: String,
//!     title: String,
//! }
//!
//! impl Component for StateBadge {
//!     fn inline_template() -> Option<&'static str> {
//!         Some(r#"<span class="badge {{ color }}" title="{{ title }}">{{ content }}</span>"#)
//!     }
//!
//!     fn rules() -> Vec<Rule> {
//!         vec![
//!             Rule::presence("content"),
//!             Rule::inclusion("color", ["green", "purple", "red"]),
//!         ]
//!     }
//! }
//!
//! let renderer = Renderer::default();
//! let badge = StateBadge { color: "red".into(), title: "Closed".into() };
//!
//! let html = renderer
//!     .render_with(&badge, |view| {
//!         view.text("Closed");
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(html.as_str(), r#"<span class="badge red" title="Closed">Closed</span>"#);
//!
//! assert!(renderer.render(&badge).unwrap_err().is_validation());
//! ```

pub mod compiler;
pub mod component;
pub mod config;
pub mod error;
pub mod handler;
pub mod parser;
pub mod renderer;
pub mod template;
pub mod validation;

pub use compiler::{CompileState, Compiled, Compiler, Routine};
pub use component::Component;
pub use config::{ComponentConfig, ConfigError};
pub use error::{ComponentError, ParseError};
pub use handler::{CallingConvention, FnHandler, HandlerRegistry, TemplateHandler};
pub use renderer::{
    escape_html, unescape_html, NoRoutes, OutputBuffer, RenderScope, Renderer, Routes, SafeHtml,
    UrlHelpers, ViewContext,
};
pub use template::{SourceAdapter, TemplateLocator, TemplateOrigin, TemplateSource};
pub use validation::{validate, Attributes, Rule, ValidationErrors, ValidationFailure};

/// Render markup template text with the default handlers
///
/// No component type is involved, so nothing is cached or validated.
///
/// # Example
///
/// ```rust
/// use view_components::{render_source, Attributes};
/// use serde_json::json;
///
/// let attrs: Attributes = json!({ "name": "<Ada>" }).as_object().unwrap().clone();
/// let html = render_source("<b>{{ name }}</b>", &attrs, None).unwrap();
/// assert_eq!(html.as_str(), "<b>&lt;Ada&gt;</b>");
/// ```
pub fn render_source(
    source: &str,
    attributes: &Attributes,
    content: Option<&str>,
) -> Result<SafeHtml, ComponentError> {
    let template = TemplateSource::inline("template", "html", source);
    let content = content.map(SafeHtml::escape);
    Renderer::default().render_source(&template, attributes, content.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_render_source_escapes_content() {
        let html =
            render_source("<p>{{ content }}</p>", &Attributes::new(), Some("a < b")).unwrap();
        assert_eq!(html.as_str(), "<p>a &lt; b</p>");
    }

    #[test]
    fn test_render_source_conditionals() {
        let html = render_source(
            "{% if admin %}<b>{{ name }}</b>{% else %}{{ name }}{% end %}",
            &attrs(json!({ "admin": true, "name": "Ada" })),
            None,
        )
        .unwrap();
        assert_eq!(html.as_str(), "<b>Ada</b>");
    }

    #[test]
    fn test_render_source_syntax_error() {
        let err = render_source("{% if name %}open", &Attributes::new(), None).unwrap_err();
        assert!(matches!(err, ComponentError::TemplateSyntax { .. }));
    }
}
