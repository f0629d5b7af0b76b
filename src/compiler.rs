//! Per-type template compilation
//!
//! Every component type is compiled at most once per [`Compiler`]: the first
//! render locates the template, hands it to the handler for its kind and
//! stores the resulting [`Routine`]. Concurrent first renders of the same type
//! block on a single compilation. A failed compilation is remembered too, so
//! a broken template fails the same way on every render until it is
//! [reloaded](Compiler::reload).

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::component::Component;
use crate::config::ComponentConfig;
use crate::error::ComponentError;
use crate::handler::HandlerRegistry;
use crate::renderer::{OutputBuffer, RenderScope, SafeHtml};
use crate::template::{TemplateLocator, TemplateOrigin, TemplateSource};

type RoutineFn =
    dyn Fn(&RenderScope<'_>, &mut OutputBuffer) -> Result<(), ComponentError> + Send + Sync;

/// A compiled template: writes one component's markup into a buffer
#[derive(Clone)]
pub struct Routine(Arc<RoutineFn>);

impl Routine {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RenderScope<'_>, &mut OutputBuffer) -> Result<(), ComponentError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run into a fresh buffer
    pub fn invoke(&self, scope: &RenderScope<'_>) -> Result<SafeHtml, ComponentError> {
        let mut out = OutputBuffer::new();
        self.write(scope, &mut out)?;
        Ok(out.into_html())
    }

    pub fn write(
        &self,
        scope: &RenderScope<'_>,
        out: &mut OutputBuffer,
    ) -> Result<(), ComponentError> {
        (self.0)(scope, out)
    }

    /// Whether both handles share one compiled routine
    pub fn ptr_eq(&self, other: &Routine) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Routine(..)")
    }
}

/// The cached result of compiling one component type
#[derive(Debug, Clone)]
pub struct Compiled {
    pub routine: Routine,
    pub kind: String,
    pub origin: TemplateOrigin,
}

/// Where a component type is in its compile lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileState {
    Uncompiled,
    Compiling,
    Compiled,
    Failed,
}

#[derive(Default)]
struct Slot {
    compiling: AtomicBool,
    result: OnceLock<Result<Compiled, ComponentError>>,
}

/// Registry of compiled routines keyed by component type
#[derive(Default)]
pub struct Compiler {
    slots: RwLock<HashMap<TypeId, Arc<Slot>>>,
    compilations: AtomicUsize,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Compiler")
            .field("types", &slots.len())
            .field("compilations", &self.compilation_count())
            .finish()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `C` unless a result (success or failure) is already cached
    pub fn ensure_compiled<C: Component>(
        &self,
        handlers: &HandlerRegistry,
        config: &ComponentConfig,
    ) -> Result<Compiled, ComponentError> {
        let slot = self.slot(TypeId::of::<C>());
        slot.result
            .get_or_init(|| {
                slot.compiling.store(true, Ordering::Release);
                self.compilations.fetch_add(1, Ordering::Relaxed);
                let result = compile::<C>(handlers, config);
                slot.compiling.store(false, Ordering::Release);
                result
            })
            .clone()
    }

    pub fn state<C: Component>(&self) -> CompileState {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match slots.get(&TypeId::of::<C>()) {
            None => CompileState::Uncompiled,
            Some(slot) => match slot.result.get() {
                Some(Ok(_)) => CompileState::Compiled,
                Some(Err(_)) => CompileState::Failed,
                None if slot.compiling.load(Ordering::Acquire) => CompileState::Compiling,
                None => CompileState::Uncompiled,
            },
        }
    }

    /// Forget the cached result for `C`; the next render compiles again
    pub fn reload<C: Component>(&self) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let removed = slots.remove(&TypeId::of::<C>()).is_some();
        if removed {
            tracing::debug!(component = C::name(), "discarded compiled template");
        }
        removed
    }

    /// Forget every cached result
    pub fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// How many component types currently hold a compiled routine
    pub fn compiled_count(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| matches!(slot.result.get(), Some(Ok(_))))
            .count()
    }

    /// How many times a handler has been asked to compile a template
    pub fn compilation_count(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    fn slot(&self, id: TypeId) -> Arc<Slot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(id).or_default())
    }
}

fn compile<C: Component>(
    handlers: &HandlerRegistry,
    config: &ComponentConfig,
) -> Result<Compiled, ComponentError> {
    let component = C::name();
    let result = TemplateLocator::new(config)
        .locate::<C>()
        .and_then(|source| compile_source(&source, handlers));

    match &result {
        Ok(compiled) => {
            tracing::info!(
                component,
                origin = %compiled.origin,
                kind = %compiled.kind,
                "compiled component template"
            );
        }
        Err(e) => {
            tracing::warn!(component, error = %e, "component template failed to compile");
        }
    }
    result
}

/// Compile already-located template text
pub fn compile_source(
    source: &TemplateSource,
    handlers: &HandlerRegistry,
) -> Result<Compiled, ComponentError> {
    let origin = source.origin.to_string();
    let routine = handlers
        .invoke(&source.adapter())
        .map_err(|e| e.with_origin(&origin))?;

    Ok(Compiled {
        routine,
        kind: source.kind.clone(),
        origin: source.origin.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FnHandler;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Inline;

    impl Component for Inline {
        fn inline_template() -> Option<&'static str> {
            Some("inline")
        }
    }

    #[derive(Serialize)]
    struct Broken;

    impl Component for Broken {
        fn inline_template() -> Option<&'static str> {
            Some("{% if x %}")
        }
    }

    #[derive(Serialize)]
    struct Floating;

    impl Component for Floating {}

    fn counting_registry(counter: Arc<AtomicUsize>) -> HandlerRegistry {
        let mut handlers = HandlerRegistry::new();
        handlers
            .register(
                "html",
                FnHandler::unary(move |t| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let text = t.source().to_string();
                    Ok(Routine::new(move |_, out| {
                        out.push_raw(&text);
                        Ok(())
                    }))
                }),
            )
            .unwrap();
        handlers
    }

    #[test]
    fn test_compiles_once_and_shares_routine() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handlers = counting_registry(Arc::clone(&counter));
        let config = ComponentConfig::default();
        let compiler = Compiler::new();

        assert_eq!(compiler.state::<Inline>(), CompileState::Uncompiled);
        let first = compiler.ensure_compiled::<Inline>(&handlers, &config).unwrap();
        let second = compiler.ensure_compiled::<Inline>(&handlers, &config).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(first.routine.ptr_eq(&second.routine));
        assert_eq!(compiler.state::<Inline>(), CompileState::Compiled);
        assert_eq!(compiler.compilation_count(), 1);
        assert_eq!(compiler.compiled_count(), 1);
    }

    #[test]
    fn test_concurrent_first_use_compiles_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handlers = counting_registry(Arc::clone(&counter));
        let config = ComponentConfig::default();
        let compiler = Compiler::new();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| compiler.ensure_compiled::<Inline>(&handlers, &config).unwrap());
            }
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_cached_until_reload() {
        let handlers = HandlerRegistry::with_defaults();
        let config = ComponentConfig::default();
        let compiler = Compiler::new();

        let err = compiler.ensure_compiled::<Broken>(&handlers, &config).unwrap_err();
        match &err {
            ComponentError::TemplateSyntax { origin, .. } => assert_eq!(origin, "Broken (inline)"),
            other => panic!("Expected TemplateSyntax, got {:?}", other),
        }
        assert!(compiler.ensure_compiled::<Broken>(&handlers, &config).is_err());
        assert_eq!(compiler.compilation_count(), 1);
        assert_eq!(compiler.state::<Broken>(), CompileState::Failed);
        assert_eq!(compiler.compiled_count(), 0);

        assert!(compiler.reload::<Broken>());
        assert_eq!(compiler.state::<Broken>(), CompileState::Uncompiled);
        assert!(compiler.ensure_compiled::<Broken>(&handlers, &config).is_err());
        assert_eq!(compiler.compilation_count(), 2);
    }

    #[test]
    fn test_unanchored_component() {
        let compiler = Compiler::new();
        let err = compiler
            .ensure_compiled::<Floating>(
                &HandlerRegistry::with_defaults(),
                &ComponentConfig::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ComponentError::UnanchoredComponent { component } if component == "Floating"
        ));
    }

    #[test]
    fn test_unknown_kind_is_reported() {
        let source = TemplateSource::inline("Widget", "haml", "%p");
        let err = compile_source(&source, &HandlerRegistry::with_defaults()).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHandler { kind } if kind == "haml"));
    }
}
