//! Rendering components to markup
//!
//! A [`Renderer`] owns the handler registry, the per-type compiler and the
//! URL helpers. Rendering one component runs in a fixed order: make sure the
//! type is compiled, capture the caller's block as content, check the
//! component's rules, then run the compiled routine.

mod helpers;
mod html;
mod scope;
mod view;

use std::fmt;
use std::sync::Arc;

pub use helpers::{NoRoutes, Routes, UrlHelpers};
pub use html::{escape_html, unescape_html, OutputBuffer, SafeHtml};
pub use scope::RenderScope;
pub use view::ViewContext;

use crate::compiler::{compile_source, CompileState, Compiled, Compiler};
use crate::component::Component;
use crate::config::ComponentConfig;
use crate::error::ComponentError;
use crate::handler::HandlerRegistry;
use crate::template::TemplateSource;
use crate::validation::{validate, Attributes};

/// Entry point for rendering components
pub struct Renderer {
    config: ComponentConfig,
    handlers: HandlerRegistry,
    compiler: Compiler,
    helpers: Arc<dyn UrlHelpers>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::with_handlers(ComponentConfig::default(), HandlerRegistry::with_defaults())
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("handlers", &self.handlers.kinds())
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Renderer with the built-in handlers plus the configured aliases
    pub fn new(config: ComponentConfig) -> Result<Self, ComponentError> {
        let mut handlers = HandlerRegistry::with_defaults();
        let mut pending: Vec<(&String, &String)> = config.aliases.iter().collect();
        pending.sort();
        // Aliases may name other aliases, so apply them once their target exists
        while !pending.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|(_, kind)| handlers.contains(kind));
            if let ([], Some((_, kind))) = (ready.as_slice(), waiting.first()) {
                return Err(ComponentError::UnknownHandler {
                    kind: kind.to_string(),
                });
            }
            for (alias, kind) in ready {
                handlers.alias(alias.as_str(), kind.as_str())?;
            }
            pending = waiting;
        }
        Ok(Self::with_handlers(config, handlers))
    }

    /// Renderer with a caller-built handler registry
    pub fn with_handlers(config: ComponentConfig, handlers: HandlerRegistry) -> Self {
        Self {
            config,
            handlers,
            compiler: Compiler::new(),
            helpers: Arc::new(NoRoutes),
        }
    }

    pub fn with_helpers(mut self, helpers: impl UrlHelpers + 'static) -> Self {
        self.helpers = Arc::new(helpers);
        self
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn helpers(&self) -> Arc<dyn UrlHelpers> {
        Arc::clone(&self.helpers)
    }

    /// A fresh view context rendering through this renderer
    pub fn view(&self) -> ViewContext<'_> {
        ViewContext::new(self)
    }

    /// Compile `C` ahead of its first render
    pub fn preload<C: Component>(&self) -> Result<(), ComponentError> {
        self.ensure_compiled::<C>().map(|_| ())
    }

    pub fn ensure_compiled<C: Component>(&self) -> Result<Compiled, ComponentError> {
        self.compiler.ensure_compiled::<C>(&self.handlers, &self.config)
    }

    pub fn compile_state<C: Component>(&self) -> CompileState {
        self.compiler.state::<C>()
    }

    /// Discard the compiled template for `C`
    pub fn reload<C: Component>(&self) -> bool {
        self.compiler.reload::<C>()
    }

    /// Render a component without content
    pub fn render<C: Component>(&self, component: &C) -> Result<SafeHtml, ComponentError> {
        self.view().render(component)
    }

    /// Render a component with the content `block` writes
    pub fn render_with<C, F>(&self, component: &C, block: F) -> Result<SafeHtml, ComponentError>
    where
        C: Component,
        F: FnOnce(&mut ViewContext<'_>) -> Result<(), ComponentError>,
    {
        self.view().render_with(component, block)
    }

    /// Compile and render template text directly, without caching or validation
    pub fn render_source(
        &self,
        template: &TemplateSource,
        attributes: &Attributes,
        content: Option<&SafeHtml>,
    ) -> Result<SafeHtml, ComponentError> {
        let compiled = compile_source(template, &self.handlers)?;
        let origin = template.origin.to_string();
        let mut scope = RenderScope::new(&origin, attributes, &*self.helpers);
        if let Some(content) = content {
            scope = scope.with_content(content);
        }
        compiled.routine.invoke(&scope)
    }

    /// Render `component` from `view`, capturing `block` as its content
    ///
    /// Compilation happens before the block runs, so a missing or broken
    /// template fails without evaluating the block. Nothing is written to
    /// the view's own output.
    pub fn render_in<C, F>(
        &self,
        view: &mut ViewContext<'_>,
        component: &C,
        block: Option<F>,
    ) -> Result<SafeHtml, ComponentError>
    where
        C: Component,
        F: FnOnce(&mut ViewContext<'_>) -> Result<(), ComponentError>,
    {
        let compiled = self.ensure_compiled::<C>()?;
        let content = match block {
            Some(block) => Some(view.capture(block)?),
            None => None,
        };
        self.render_compiled(component, &compiled, content.as_ref(), view.helpers())
    }

    fn render_compiled<C: Component>(
        &self,
        component: &C,
        compiled: &Compiled,
        content: Option<&SafeHtml>,
        helpers: &dyn UrlHelpers,
    ) -> Result<SafeHtml, ComponentError> {
        let name = C::name();
        let attributes = component.attributes()?;
        validate(name, &C::rules(), &attributes, content)?;

        let mut scope = RenderScope::new(name, &attributes, helpers);
        if let Some(content) = content {
            scope = scope.with_content(content);
        }
        let html = compiled.routine.invoke(&scope)?;
        tracing::trace!(component = name, bytes = html.as_str().len(), "rendered component");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct Link {
        id: u32,
        label: String,
    }

    impl Component for Link {
        fn inline_template() -> Option<&'static str> {
            Some(r#"<a href="{{ url("issue", id) }}">{{ label }}</a>"#)
        }
    }

    #[derive(Serialize)]
    struct Panel {
        heading: String,
    }

    impl Component for Panel {
        fn inline_template() -> Option<&'static str> {
            Some("<section><h2>{{ heading }}</h2>{{ content }}</section>")
        }

        fn rules() -> Vec<Rule> {
            vec![Rule::presence("heading")]
        }
    }

    #[test]
    fn test_url_helpers_reach_templates() {
        let renderer =
            Renderer::default().with_helpers(Routes::new().route("issue", "/issues/:id"));
        let html = renderer
            .render(&Link {
                id: 5,
                label: "Bug & fix".into(),
            })
            .unwrap();
        assert_eq!(html.as_str(), r#"<a href="/issues/5">Bug &amp; fix</a>"#);
    }

    #[test]
    fn test_nested_component_in_block() {
        let renderer =
            Renderer::default().with_helpers(Routes::new().route("issue", "/issues/:id"));
        let html = renderer
            .render_with(&Panel { heading: "Links".into() }, |view| {
                view.append(&Link {
                    id: 1,
                    label: "one".into(),
                })?;
                Ok(())
            })
            .unwrap();
        assert_eq!(
            html.as_str(),
            r#"<section><h2>Links</h2><a href="/issues/1">one</a></section>"#
        );
    }

    #[test]
    fn test_validation_runs_before_template() {
        let renderer = Renderer::default();
        let err = renderer.render(&Panel { heading: " ".into() }).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed: Heading can't be blank");
    }

    #[test]
    fn test_preload_compiles_ahead_of_render() {
        let renderer = Renderer::default();
        assert_eq!(renderer.compile_state::<Panel>(), CompileState::Uncompiled);
        renderer.preload::<Panel>().unwrap();
        assert_eq!(renderer.compile_state::<Panel>(), CompileState::Compiled);
        assert_eq!(renderer.compiler().compilation_count(), 1);
    }

    #[test]
    fn test_render_source_is_uncached() {
        let renderer = Renderer::default();
        let template = TemplateSource::inline("Scratch", "html", "<p>{{ n }}</p>");
        let attrs = json!({ "n": 2 });
        let html = renderer
            .render_source(&template, attrs.as_object().unwrap(), None)
            .unwrap();
        assert_eq!(html.as_str(), "<p>2</p>");
        assert_eq!(renderer.compiler().compilation_count(), 0);
    }

    #[test]
    fn test_configured_alias() {
        let config = ComponentConfig::default().with_alias("htm", "html");
        let renderer = Renderer::new(config).unwrap();
        assert!(renderer.handlers().contains("htm"));
    }

    #[test]
    fn test_configured_alias_chain_in_any_order() {
        let config = ComponentConfig::default()
            .with_alias("a", "b")
            .with_alias("b", "html");
        let renderer = Renderer::new(config).unwrap();
        assert_eq!(renderer.handlers().resolve("a").unwrap().kind, "html");
    }

    #[test]
    fn test_configured_alias_to_unknown_kind() {
        let config = ComponentConfig::default().with_alias("md", "markdown");
        let err = Renderer::new(config).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHandler { kind } if kind == "markdown"));
    }
}
