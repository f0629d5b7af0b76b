//! Template discovery
//!
//! Resolves the one template belonging to a component type: either its
//! inline template or the sidecar file next to the file that defines it.

mod locator;
mod source;

pub use locator::{audit_sidecars, sidecar_candidates, SidecarConflict, TemplateLocator};
pub use source::{template_kind, SourceAdapter, TemplateOrigin, TemplateSource};
