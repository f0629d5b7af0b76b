//! What a compiled routine can see while it runs

use serde_json::Value;

use crate::error::ComponentError;
use crate::validation::Attributes;

use super::helpers::UrlHelpers;
use super::html::SafeHtml;

static NULL: Value = Value::Null;

/// Attributes, captured content and helpers for one render
#[derive(Clone, Copy)]
pub struct RenderScope<'a> {
    component: &'a str,
    attributes: &'a Attributes,
    content: Option<&'a SafeHtml>,
    helpers: &'a dyn UrlHelpers,
}

impl<'a> RenderScope<'a> {
    pub fn new(
        component: &'a str,
        attributes: &'a Attributes,
        helpers: &'a dyn UrlHelpers,
    ) -> Self {
        Self {
            component,
            attributes,
            content: None,
            helpers,
        }
    }

    pub fn with_content(mut self, content: &'a SafeHtml) -> Self {
        self.content = Some(content);
        self
    }

    pub fn component(&self) -> &'a str {
        self.component
    }

    pub fn attributes(&self) -> &'a Attributes {
        self.attributes
    }

    pub fn content(&self) -> Option<&'a SafeHtml> {
        self.content
    }

    pub fn helpers(&self) -> &'a dyn UrlHelpers {
        self.helpers
    }

    /// Resolve a dotted attribute path
    ///
    /// The first segment must name an attribute. Later segments index into
    /// objects by key and arrays by position; a missing key there is null.
    pub fn lookup(&self, path: &[String]) -> Result<&'a Value, ComponentError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(&NULL);
        };
        let root = self
            .attributes
            .get(first)
            .ok_or_else(|| ComponentError::UndefinedAttribute {
                component: self.component.to_string(),
                name: first.clone(),
            })?;

        Ok(rest.iter().fold(root, |value, segment| match value {
            Value::Object(map) => map.get(segment).unwrap_or(&NULL),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .unwrap_or(&NULL),
            _ => &NULL,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NoRoutes;
    use serde_json::json;

    fn path(s: &str) -> Vec<String> {
        s.split('.').map(String::from).collect()
    }

    #[test]
    fn test_lookup_nested_values() {
        let attrs = json!({ "author": { "name": "Ada", "tags": ["x", "y"] } });
        let attrs = attrs.as_object().unwrap();
        let scope = RenderScope::new("Card", attrs, &NoRoutes);

        assert_eq!(scope.lookup(&path("author.name")).unwrap(), &json!("Ada"));
        assert_eq!(scope.lookup(&path("author.tags.1")).unwrap(), &json!("y"));
        assert_eq!(scope.lookup(&path("author.email")).unwrap(), &Value::Null);
    }

    #[test]
    fn test_unknown_root_is_error() {
        let attrs = Attributes::new();
        let scope = RenderScope::new("Card", &attrs, &NoRoutes);
        let err = scope.lookup(&path("title")).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::UndefinedAttribute { component, name }
                if component == "Card" && name == "title"
        ));
    }
}
