//! Handlers for templates without markup syntax

use std::sync::Arc;

use crate::compiler::Routine;
use crate::error::ComponentError;
use crate::template::SourceAdapter;

use super::{CallingConvention, TemplateHandler};

/// `raw` templates: emitted verbatim
#[derive(Debug, Default, Clone, Copy)]
pub struct RawHandler;

impl TemplateHandler for RawHandler {
    fn convention(&self) -> CallingConvention {
        CallingConvention::Binary
    }

    fn call_with_source(
        &self,
        _template: &SourceAdapter<'_>,
        source: &str,
    ) -> Result<Routine, ComponentError> {
        let markup: Arc<str> = Arc::from(source);
        Ok(Routine::new(move |_, out| {
            out.push_raw(&markup);
            Ok(())
        }))
    }
}

/// `text` templates: plain text, escaped
#[derive(Debug, Default, Clone, Copy)]
pub struct TextHandler;

impl TemplateHandler for TextHandler {
    fn convention(&self) -> CallingConvention {
        CallingConvention::Binary
    }

    fn call_with_source(
        &self,
        _template: &SourceAdapter<'_>,
        source: &str,
    ) -> Result<Routine, ComponentError> {
        let text: Arc<str> = Arc::from(source);
        Ok(Routine::new(move |_, out| {
            out.push_text(&text);
            Ok(())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{NoRoutes, RenderScope};
    use crate::validation::Attributes;

    fn render(handler: &dyn TemplateHandler, source: &str) -> String {
        let routine = handler
            .call_with_source(&SourceAdapter::new(source, "test"), source)
            .unwrap();
        let attributes = Attributes::new();
        let scope = RenderScope::new("Test", &attributes, &NoRoutes);
        routine.invoke(&scope).unwrap().into_string()
    }

    #[test]
    fn test_raw_keeps_markup_and_braces() {
        assert_eq!(render(&RawHandler, "<b>{{ x }}</b>"), "<b>{{ x }}</b>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render(&TextHandler, "1 < 2 & 3"), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_unary_call_is_mismatch() {
        let err = RawHandler.call(&SourceAdapter::new("x", "raw")).unwrap_err();
        assert!(matches!(
            err,
            ComponentError::HandlerInvocationMismatch {
                convention: CallingConvention::Unary,
                ..
            }
        ));
    }
}
