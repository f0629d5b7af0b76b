//! The view context a render runs in

use std::sync::Arc;

use crate::component::Component;
use crate::error::ComponentError;

use super::helpers::UrlHelpers;
use super::html::{OutputBuffer, SafeHtml};
use super::Renderer;

type NoBlock = fn(&mut ViewContext<'_>) -> Result<(), ComponentError>;

/// Rendering surface handed to blocks
///
/// Owns an output buffer that blocks write into, and the URL helpers that
/// templates rendered from here can call.
pub struct ViewContext<'r> {
    renderer: &'r Renderer,
    helpers: Arc<dyn UrlHelpers>,
    output: OutputBuffer,
}

impl<'r> ViewContext<'r> {
    pub fn new(renderer: &'r Renderer) -> Self {
        Self {
            renderer,
            helpers: renderer.helpers(),
            output: OutputBuffer::new(),
        }
    }

    /// Use different URL helpers for renders from this context
    pub fn with_helpers(mut self, helpers: Arc<dyn UrlHelpers>) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn helpers(&self) -> &dyn UrlHelpers {
        &*self.helpers
    }

    /// Write text, escaped
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.output.push_text(text);
        self
    }

    /// Write markup without escaping
    pub fn safe(&mut self, html: &SafeHtml) -> &mut Self {
        self.output.push_safe(html);
        self
    }

    /// Run `block` against an empty buffer and return what it wrote
    ///
    /// The surrounding output is restored afterwards, whether or not the
    /// block succeeds.
    pub fn capture<F>(&mut self, block: F) -> Result<SafeHtml, ComponentError>
    where
        F: FnOnce(&mut Self) -> Result<(), ComponentError>,
    {
        let outer = std::mem::take(&mut self.output);
        let result = block(self);
        let captured = std::mem::replace(&mut self.output, outer);
        result.map(|()| captured.into_html())
    }

    /// Render a component without content
    pub fn render<C: Component>(&mut self, component: &C) -> Result<SafeHtml, ComponentError> {
        let renderer = self.renderer;
        renderer.render_in(self, component, None::<NoBlock>)
    }

    /// Render a component with the content `block` writes
    pub fn render_with<C, F>(&mut self, component: &C, block: F) -> Result<SafeHtml, ComponentError>
    where
        C: Component,
        F: FnOnce(&mut ViewContext<'_>) -> Result<(), ComponentError>,
    {
        let renderer = self.renderer;
        renderer.render_in(self, component, Some(block))
    }

    /// Render a component and append it to this context's output
    pub fn append<C: Component>(&mut self, component: &C) -> Result<&mut Self, ComponentError> {
        let html = self.render(component)?;
        Ok(self.safe(&html))
    }

    pub fn into_html(self) -> SafeHtml {
        self.output.into_html()
    }
}
