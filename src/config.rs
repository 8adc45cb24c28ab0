//! `jsonr.toml` configuration.
//!
//! Every section and key is optional; command-line flags override file values.
//!
//! # Example
//!
//! ```toml
//! [transform]
//! order = "depthFirstPre"   # or "depthFirstPost", "breadthFirst"
//! allow = ["div", "span", "Button"]
//! strict = false
//!
//! [transform.rename]
//! Btn = "Button"
//!
//! [render]
//! handler_prefix = "on"
//! targets = ["#modal-root"]
//!
//! [registry]
//! deny = ["script"]
//!
//! [registry.aliases]
//! Title = "h1"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jsonr_core::{JsonrError, JsonrResult, TransformOptions, TraversalOrder};
use jsonr_render::{Registry, DEFAULT_HANDLER_PREFIX};
use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "jsonr.toml";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub transform: TransformSection,
    pub render: RenderSection,
    pub registry: RegistrySection,
}

/// `[transform]`: pipeline options and built-in visitors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    pub order: TraversalOrder,
    /// Allow-list for structured node types. Empty means everything passes.
    pub allow: Vec<String>,
    /// Fail instead of nulling out types missing from `allow`.
    pub strict: bool,
    /// Type aliases applied before validation. Targets must not be empty.
    pub rename: BTreeMap<String, String>,
}

impl Default for TransformSection {
    fn default() -> Self {
        TransformSection {
            order: TraversalOrder::default(),
            allow: Vec::new(),
            strict: false,
            rename: BTreeMap::new(),
        }
    }
}

/// `[render]`: renderer context settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub handler_prefix: String,
    /// Selectors that portal containers may resolve to.
    pub targets: Vec<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        RenderSection {
            handler_prefix: DEFAULT_HANDLER_PREFIX.to_string(),
            targets: Vec::new(),
        }
    }
}

/// `[registry]`: custom registry entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    /// Type name to tag. Tags must not be empty.
    pub aliases: BTreeMap<String, String>,
    /// Types that must never render.
    pub deny: Vec<String>,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> JsonrResult<Config> {
        let config: Config = toml::from_str(content)
            .map_err(|e| JsonrError::invalid_args(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> JsonrResult<Config> {
        if !path.exists() {
            return Err(JsonrError::file_not_found(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            JsonrError::internal(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            JsonrError::invalid_args(format!("invalid TOML in {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce nodes with an empty type.
    fn validate(&self) -> JsonrResult<()> {
        let empty = |table: &BTreeMap<String, String>| {
            table
                .iter()
                .find(|(_, to)| to.is_empty())
                .map(|(from, _)| from.clone())
        };
        if let Some(from) = empty(&self.transform.rename) {
            return Err(JsonrError::invalid_args(format!(
                "invalid configuration: [transform.rename] target for '{}' is empty",
                from
            )));
        }
        if let Some(name) = empty(&self.registry.aliases) {
            return Err(JsonrError::invalid_args(format!(
                "invalid configuration: [registry.aliases] tag for '{}' is empty",
                name
            )));
        }
        Ok(())
    }

    /// Load `explicit` if given, else `jsonr.toml` in `dir` if present, else
    /// the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> JsonrResult<Config> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        let candidate: PathBuf = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading configuration");
            return Config::load(&candidate);
        }
        Ok(Config::default())
    }

    /// Pipeline options, with an optional order override.
    pub fn transform_options(&self, order: Option<TraversalOrder>) -> TransformOptions {
        TransformOptions::new().with_order(order.unwrap_or(self.transform.order))
    }

    /// Build the component registry.
    pub fn registry(&self) -> Registry {
        let mut registry = Registry::default();
        for (name, tag) in &self.registry.aliases {
            registry = registry.with_tag(name.clone(), tag.clone());
        }
        for name in &self.registry.deny {
            registry = registry.deny(name.clone());
        }
        registry
    }
}
