//! Template handlers
//!
//! A handler turns the text of one template kind into a [`Routine`]. Handlers
//! come in two calling conventions: unary handlers read the source from the
//! [`SourceAdapter`], binary handlers also receive the source text as a
//! separate argument. The convention is captured once, when the handler is
//! registered.

mod markup;
mod plain;
mod registry;

use std::fmt;

pub use markup::{MarkupHandler, HELPERS};
pub use plain::{RawHandler, TextHandler};
pub use registry::{HandlerRegistry, RegisteredHandler};

use crate::compiler::Routine;
use crate::error::ComponentError;
use crate::template::SourceAdapter;

/// How a handler expects to be called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    /// `call(adapter)`
    Unary,
    /// `call_with_source(adapter, source)`
    Binary,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Unary => f.write_str("unary"),
            CallingConvention::Binary => f.write_str("binary"),
        }
    }
}

/// Compiles template text of one kind into a render routine
///
/// Implement the call matching [`convention`](TemplateHandler::convention);
/// the other one reports a [`ComponentError::HandlerInvocationMismatch`].
pub trait TemplateHandler: Send + Sync {
    fn convention(&self) -> CallingConvention;

    fn call(&self, template: &SourceAdapter<'_>) -> Result<Routine, ComponentError> {
        Err(ComponentError::HandlerInvocationMismatch {
            kind: template.kind().to_string(),
            convention: CallingConvention::Unary,
        })
    }

    fn call_with_source(
        &self,
        template: &SourceAdapter<'_>,
        _source: &str,
    ) -> Result<Routine, ComponentError> {
        Err(ComponentError::HandlerInvocationMismatch {
            kind: template.kind().to_string(),
            convention: CallingConvention::Binary,
        })
    }
}

type UnaryFn = dyn Fn(&SourceAdapter<'_>) -> Result<Routine, ComponentError> + Send + Sync;
type BinaryFn = dyn Fn(&SourceAdapter<'_>, &str) -> Result<Routine, ComponentError> + Send + Sync;

/// A handler backed by a closure
pub enum FnHandler {
    Unary(Box<UnaryFn>),
    Binary(Box<BinaryFn>),
}

impl FnHandler {
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&SourceAdapter<'_>) -> Result<Routine, ComponentError> + Send + Sync + 'static,
    {
        Self::Unary(Box::new(f))
    }

    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(&SourceAdapter<'_>, &str) -> Result<Routine, ComponentError> + Send + Sync + 'static,
    {
        Self::Binary(Box::new(f))
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnHandler({})", self.convention())
    }
}

impl TemplateHandler for FnHandler {
    fn convention(&self) -> CallingConvention {
        match self {
            FnHandler::Unary(_) => CallingConvention::Unary,
            FnHandler::Binary(_) => CallingConvention::Binary,
        }
    }

    fn call(&self, template: &SourceAdapter<'_>) -> Result<Routine, ComponentError> {
        match self {
            FnHandler::Unary(f) => f(template),
            FnHandler::Binary(_) => Err(ComponentError::HandlerInvocationMismatch {
                kind: template.kind().to_string(),
                convention: CallingConvention::Unary,
            }),
        }
    }

    fn call_with_source(
        &self,
        template: &SourceAdapter<'_>,
        source: &str,
    ) -> Result<Routine, ComponentError> {
        match self {
            FnHandler::Binary(f) => f(template, source),
            FnHandler::Unary(_) => Err(ComponentError::HandlerInvocationMismatch {
                kind: template.kind().to_string(),
                convention: CallingConvention::Binary,
            }),
        }
    }
}
