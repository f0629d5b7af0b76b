//! Resolved template text and the adapter handed to handlers

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ComponentError;

/// Where a template's text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    /// A sidecar file
    File(PathBuf),
    /// The component's inline template
    Inline { component: String },
}

impl fmt::Display for TemplateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateOrigin::File(path) => write!(f, "{}", path.display()),
            TemplateOrigin::Inline { component } => write!(f, "{} (inline)", component),
        }
    }
}

/// Template text together with its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub origin: TemplateOrigin,
    /// Handler key, normally the file extension
    pub kind: String,
    pub text: String,
}

impl TemplateSource {
    pub fn inline(
        component: impl Into<String>,
        kind: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            origin: TemplateOrigin::Inline {
                component: component.into(),
            },
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// Read a template file; its last extension is its kind
    pub fn read(path: &Path) -> Result<Self, ComponentError> {
        let kind = template_kind(path).ok_or_else(|| ComponentError::TemplateRead {
            path: path.to_path_buf(),
            message: "file has no extension to select a template handler".to_string(),
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| ComponentError::TemplateRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            origin: TemplateOrigin::File(path.to_path_buf()),
            kind,
            text,
        })
    }

    pub fn adapter(&self) -> SourceAdapter<'_> {
        SourceAdapter::new(&self.text, &self.kind)
    }
}

/// The kind a template file selects, from its last extension
pub fn template_kind(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_string())
}

/// Minimal view of a template presented to handlers
///
/// Carries only the text and kind; the identifier is an empty placeholder.
#[derive(Debug, Clone, Copy)]
pub struct SourceAdapter<'a> {
    source: &'a str,
    kind: &'a str,
}

impl<'a> SourceAdapter<'a> {
    pub fn new(source: &'a str, kind: &'a str) -> Self {
        Self { source, kind }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn kind(&self) -> &'a str {
        self.kind
    }

    pub fn identifier(&self) -> &'static str {
        ""
    }
}
