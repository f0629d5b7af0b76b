//! Sidecar template discovery
//!
//! A component's template lives next to the file that defines it and shares
//! that file's base name: `state_badge.rs` pairs with `state_badge.html`.
//! Exactly one such file must exist; there is no precedence between
//! candidates.

use std::io;
use std::path::{Path, PathBuf};

use crate::component::Component;
use crate::config::ComponentConfig;
use crate::error::ComponentError;

use super::source::TemplateSource;

/// Finds the template for a component type
#[derive(Debug, Clone, Copy)]
pub struct TemplateLocator<'a> {
    root: Option<&'a Path>,
    default_kind: &'a str,
}

impl<'a> TemplateLocator<'a> {
    pub fn new(config: &'a ComponentConfig) -> Self {
        Self {
            root: config.template_root.as_deref(),
            default_kind: &config.default_kind,
        }
    }

    /// Resolve the template source for `C`
    ///
    /// An inline template short-circuits discovery entirely, even if sidecar
    /// files exist.
    pub fn locate<C: Component>(&self) -> Result<TemplateSource, ComponentError> {
        let component = C::name();

        if let Some(text) = C::inline_template() {
            tracing::debug!(component, kind = self.default_kind, "using inline template");
            return Ok(TemplateSource::inline(component, self.default_kind, text));
        }

        let anchor = C::source_file().ok_or_else(|| ComponentError::UnanchoredComponent {
            component: component.to_string(),
        })?;

        self.locate_sidecar(component, &anchor)
    }

    /// Find and read the single sidecar next to `anchor`
    pub fn locate_sidecar(
        &self,
        component: &str,
        anchor: &Path,
    ) -> Result<TemplateSource, ComponentError> {
        let anchor = self.resolve(anchor);
        let mut candidates = sidecar_candidates(&anchor).map_err(|e| ComponentError::TemplateRead {
            path: anchor_dir(&anchor).to_path_buf(),
            message: e.to_string(),
        })?;

        match candidates.len() {
            0 => Err(ComponentError::MissingTemplate {
                component: component.to_string(),
                pattern: sidecar_pattern(&anchor),
            }),
            1 => {
                let path = candidates.remove(0);
                tracing::debug!(component, path = %path.display(), "found sidecar template");
                TemplateSource::read(&path)
            }
            _ => Err(ComponentError::AmbiguousTemplate {
                component: component.to_string(),
                candidates,
            }),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn anchor_dir(anchor: &Path) -> &Path {
    match anchor.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn sidecar_pattern(anchor: &Path) -> PathBuf {
    let stem = anchor
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    anchor_dir(anchor).join(format!("{}.*", stem))
}

/// Files next to `anchor` named `<stem>.*`, excluding `anchor` itself
///
/// Sorted, so error messages and audits are stable.
pub fn sidecar_candidates(anchor: &Path) -> io::Result<Vec<PathBuf>> {
    let (Some(stem), Some(own_name)) = (anchor.file_stem(), anchor.file_name()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{}.", stem.to_string_lossy());

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(anchor_dir(anchor))? {
        let entry = entry?;
        let name = entry.file_name();
        if name.as_os_str() == own_name || !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }
        candidates.push(entry.path());
    }

    candidates.sort();
    Ok(candidates)
}

/// A source file with more than one sidecar candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarConflict {
    pub anchor: PathBuf,
    pub candidates: Vec<PathBuf>,
}

/// Check every `.rs` file in `dir` for ambiguous sidecars
///
/// Lets a host fail at startup instead of on the first render.
pub fn audit_sidecars(dir: &Path) -> io::Result<Vec<SidecarConflict>> {
    let mut anchors: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    anchors.sort();

    let mut conflicts = Vec::new();
    for anchor in anchors {
        let candidates = sidecar_candidates(&anchor)?;
        if candidates.len() > 1 {
            tracing::warn!(
                anchor = %anchor.display(),
                count = candidates.len(),
                "ambiguous sidecar templates"
            );
            conflicts.push(SidecarConflict { anchor, candidates });
        }
    }
    Ok(conflicts)
}
