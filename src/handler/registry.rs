//! Handler registry keyed by template kind

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::compiler::Routine;
use crate::error::ComponentError;
use crate::template::SourceAdapter;

use super::{CallingConvention, MarkupHandler, RawHandler, TemplateHandler, TextHandler};

/// A handler together with the convention captured at registration
#[derive(Clone)]
pub struct RegisteredHandler {
    pub kind: String,
    pub convention: CallingConvention,
    handler: Arc<dyn TemplateHandler>,
}

impl fmt::Debug for RegisteredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredHandler")
            .field("kind", &self.kind)
            .field("convention", &self.convention)
            .finish_non_exhaustive()
    }
}

impl RegisteredHandler {
    /// Call the handler with the convention it registered with
    pub fn invoke(&self, template: &SourceAdapter<'_>) -> Result<Routine, ComponentError> {
        match self.convention {
            CallingConvention::Unary => self.handler.call(template),
            CallingConvention::Binary => {
                self.handler.call_with_source(template, template.source())
            }
        }
    }
}

/// Registry mapping template kinds to handlers
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, RegisteredHandler>,
    aliases: HashMap<String, String>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `html`, `raw` and `text` handlers
    pub fn with_defaults() -> Self {
        let builtins: [(&str, Arc<dyn TemplateHandler>); 3] = [
            ("html", Arc::new(MarkupHandler)),
            ("raw", Arc::new(RawHandler)),
            ("text", Arc::new(TextHandler)),
        ];

        let mut registry = Self::new();
        registry.handlers.extend(
            builtins
                .into_iter()
                .map(|(kind, handler)| (kind.to_string(), registered(kind, handler))),
        );
        registry
    }

    /// Register a handler for a kind
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: impl TemplateHandler + 'static,
    ) -> Result<(), ComponentError> {
        self.register_shared(kind, Arc::new(handler))
    }

    /// Register a handler that is shared with other owners
    pub fn register_shared(
        &mut self,
        kind: impl Into<String>,
        handler: Arc<dyn TemplateHandler>,
    ) -> Result<(), ComponentError> {
        let kind = kind.into();
        if self.handlers.contains_key(&kind) || self.aliases.contains_key(&kind) {
            return Err(ComponentError::DuplicateHandler { kind });
        }
        tracing::debug!(
            kind = %kind,
            convention = %handler.convention(),
            "registered template handler"
        );
        self.handlers.insert(kind.clone(), registered(&kind, handler));
        Ok(())
    }

    /// Let templates of kind `alias` use the handler for `kind`
    ///
    /// `kind` may itself be an alias; the alias is stored against the
    /// handler it finally names.
    pub fn alias(
        &mut self,
        alias: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<(), ComponentError> {
        let alias = alias.into();
        if self.handlers.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(ComponentError::DuplicateHandler { kind: alias });
        }
        let target = self.resolve(&kind.into())?.kind.clone();
        tracing::debug!(alias = %alias, kind = %target, "registered template kind alias");
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Look up the handler for a kind, following aliases
    pub fn resolve(&self, kind: &str) -> Result<&RegisteredHandler, ComponentError> {
        let canonical = self.aliases.get(kind).map(String::as_str).unwrap_or(kind);
        self.handlers
            .get(canonical)
            .ok_or_else(|| ComponentError::UnknownHandler {
                kind: kind.to_string(),
            })
    }

    /// Compile a template with the handler for its kind
    pub fn invoke(&self, template: &SourceAdapter<'_>) -> Result<Routine, ComponentError> {
        self.resolve(template.kind())?.invoke(template)
    }

    /// Check if a kind can be handled
    pub fn contains(&self, kind: &str) -> bool {
        self.resolve(kind).is_ok()
    }

    /// All registered kinds, aliases included, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self
            .handlers
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();
        kinds.sort_unstable();
        kinds
    }
}

fn registered(kind: &str, handler: Arc<dyn TemplateHandler>) -> RegisteredHandler {
    RegisteredHandler {
        kind: kind.to_string(),
        convention: handler.convention(),
        handler,
    }
}
