//! Renderer configuration
//!
//! Usually built in code, or loaded from a TOML file:
//!
//! ```toml
//! [templates]
//! root = "app/components"
//! default_kind = "html"
//!
//! [handlers.aliases]
//! htm = "html"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Where templates are found and how they are handled
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentConfig {
    /// Base directory for relative component source paths
    pub template_root: Option<PathBuf>,
    /// Handler kind for inline templates
    pub default_kind: String,
    /// Extra template kinds mapped onto registered handlers
    pub aliases: HashMap<String, String>,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            template_root: None,
            default_kind: "html".to_string(),
            aliases: HashMap::new(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    templates: TomlTemplates,
    #[serde(default)]
    handlers: TomlHandlers,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlTemplates {
    root: Option<PathBuf>,
    default_kind: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlHandlers {
    #[serde(default)]
    aliases: HashMap<String, String>,
}

impl ComponentConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// A relative `templates.root` is taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        config.template_root = config.template_root.take().map(|root| match path.parent() {
            Some(dir) if root.is_relative() => dir.join(root),
            _ => root,
        });
        Ok(config)
    }

    /// Load from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(ComponentConfig {
            template_root: parsed.templates.root,
            default_kind: parsed.templates.default_kind.unwrap_or(defaults.default_kind),
            aliases: parsed.handlers.aliases,
        })
    }

    /// Set the directory relative component paths are resolved against
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = Some(root.into());
        self
    }

    /// Set the handler kind used for inline templates
    pub fn with_default_kind(mut self, kind: impl Into<String>) -> Self {
        self.default_kind = kind.into();
        self
    }

    /// Map an extra template kind onto an existing handler
    pub fn with_alias(mut self, alias: impl Into<String>, kind: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), kind.into());
        self
    }
}
