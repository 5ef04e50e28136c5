//! `pom.yaml` loading
//!
//! A file holds one YAML document per variant; the document without a
//! `variant` key is the default one.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::{Pom, PomLayer};

/// Name of the POM descriptor in a project directory
pub const POM_FILE: &str = "pom.yaml";

/// Parses every document of a POM file, skipping empty ones
pub fn parse_poms(content: &str) -> Result<Vec<Pom>> {
    let mut poms = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = serde_yaml::Value::deserialize(document)
            .with_context(|| format!("Invalid YAML in document {}", index + 1))?;
        if value.is_null() {
            continue;
        }
        let pom: Pom = serde_yaml::from_value(value)
            .with_context(|| format!("Invalid POM in document {}", index + 1))?;
        poms.push(pom);
    }
    Ok(poms)
}

/// Loads the POM layer of a directory; a missing file is an empty layer
pub fn load_layer(dir: &Path) -> Result<PomLayer> {
    let path = dir.join(POM_FILE);
    if !path.is_file() {
        return Ok(PomLayer::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read POM: {}", path.display()))?;
    let poms = parse_poms(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    PomLayer::new(poms).with_context(|| format!("Invalid POM documents in {}", path.display()))
}
