//! Build properties
//!
//! Properties are looked up in the project `gradle.properties`, the root
//! `gradle.properties`, the user-level file, then `ORG_GRADLE_PROJECT_<name>`
//! environment variables. The first source defining a name wins.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::PropertySource;

/// Prefix of environment variables carrying build properties
pub const ENV_PREFIX: &str = "ORG_GRADLE_PROJECT_";

/// Name of the properties file in a project directory
pub const PROPERTIES_FILE: &str = "gradle.properties";

/// Parses the `key=value` lines of a properties file
///
/// `key: value` is accepted too. Lines starting with `#` or `!` are comments
/// and a trailing backslash continues the value on the next line.
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    let mut pending = String::new();

    for raw in content.lines() {
        let line = raw.trim();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            continue;
        }
        pending.push_str(line);
        let logical = std::mem::take(&mut pending);

        let Some(idx) = logical.find(['=', ':']) else {
            props.insert(logical, String::new());
            continue;
        };
        let key = logical[..idx].trim();
        let value = logical[idx + 1..].trim();
        if !key.is_empty() {
            props.insert(key.to_string(), value.to_string());
        }
    }
    props
}

/// Reads a properties file; a missing file is empty
pub fn read_properties(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read properties: {}", path.display()))?;
    Ok(parse_properties(&content))
}

/// Properties of the process environment with [`ENV_PREFIX`] stripped
pub fn env_properties(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|name| (name.to_string(), v)))
        .collect()
}

/// Property source over several layers, first match wins
#[derive(Debug, Clone, Default)]
pub struct LayeredProperties {
    layers: Vec<HashMap<String, String>>,
}

impl LayeredProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer below the existing ones
    pub fn with_layer(mut self, layer: HashMap<String, String>) -> Self {
        self.layers.push(layer);
        self
    }

    /// All defined names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .layers
            .iter()
            .flat_map(|layer| layer.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl PropertySource for LayeredProperties {
    fn property(&self, name: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(name).cloned())
    }
}
