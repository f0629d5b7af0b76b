//! The component contract
//!
//! A component is a plain struct whose serialized fields are its attributes.
//! It declares where its template lives (the file that defines it, so the
//! sidecar can be discovered next to it, or an inline template) and which
//! validation rules must hold before it renders.
//!
//! # Example
//!
//! ```rust
//! use serde::Serialize;
//! use view_components::{Component, Renderer, Rule};
//!
//! #[derive(Serialize)]
//! struct Greeting {
//!     title: String,
//! }
//!
//! impl Component for Greeting {
//!     fn inline_template() -> Option<&'static str> {
//!         Some(r#"<span title="{{ title }}">Hello, {{ content }}!</span>"#)
//!     }
//!
//!     fn rules() -> Vec<Rule> {
//!         vec![Rule::presence("content")]
//!     }
//! }
//!
//! let renderer = Renderer::default();
//! let mut view = renderer.view();
//! let html = view
//!     .render_with(&Greeting { title: "greeting".into() }, |view| {
//!         view.text("world");
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(html.as_str(), r#"<span title="greeting">Hello, world!</span>"#);
//! ```

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::error::ComponentError;
use crate::validation::{Attributes, Rule};

/// A renderable component type
///
/// Compilation is per type: every instance of a component shares one
/// compiled routine.
pub trait Component: Serialize + 'static {
    /// Display name used in errors and logs
    fn name() -> &'static str {
        short_type_name::<Self>()
    }

    /// The source file defining this component
    ///
    /// The sidecar template is the single file in the same directory that
    /// shares this file's base name. Relative paths are resolved against
    /// [`ComponentConfig::template_root`](crate::ComponentConfig), or the
    /// working directory when no root is configured. Use
    /// [`component_source!`](crate::component_source) to anchor to the
    /// current file.
    fn source_file() -> Option<PathBuf> {
        None
    }

    /// Inline template source; when present, sidecar discovery is skipped
    fn inline_template() -> Option<&'static str> {
        None
    }

    /// Rules checked before every render
    fn rules() -> Vec<Rule> {
        Vec::new()
    }

    /// Attribute values visible to validation and the template
    fn attributes(&self) -> Result<Attributes, ComponentError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(Attributes::new()),
            Ok(other) => Err(ComponentError::InvalidAttributes {
                component: Self::name().to_string(),
                message: format!("expected named fields, got {}", other),
            }),
            Err(e) => Err(ComponentError::InvalidAttributes {
                component: Self::name().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Anchor a component to the file this macro is invoked from
///
/// ```rust,ignore
/// impl Component for StateBadge {
///     fn source_file() -> Option<PathBuf> {
///         view_components::component_source!()
///     }
/// }
/// ```
#[macro_export]
macro_rules! component_source {
    () => {
        ::std::option::Option::Some(::std::path::PathBuf::from(::std::file!()))
    };
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Drop generic arguments before taking the last path segment
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
