//! # Storage Layer
//!
//! Reads a workspace from disk and configures it.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Build layout and declarations | TOML | `jarbird.toml` at the root |
//! | POM metadata | Multi-document YAML | `pom.yaml` at the root and per project |
//! | Repository properties | `key=value` | `gradle.properties` per project, user config dir |
//!
//! Properties can also come from `ORG_GRADLE_PROJECT_<name>` environment
//! variables.
//!
//! ## Key Types
//!
//! - [`Descriptor`] - Parsed `jarbird.toml`
//! - [`Workspace`] - Configured projects and their task graph
//! - [`LayeredProperties`] - Property lookup across files and environment

mod config;
mod properties;
mod pom_loader;
mod workspace;

pub use config::{
    Descriptor, DescriptorError, ProjectEntry, PubEntry, RepoDecl, Settings, DESCRIPTOR_FILE,
};
pub use properties::{
    env_properties, parse_properties, read_properties, LayeredProperties, ENV_PREFIX,
    PROPERTIES_FILE,
};
pub use pom_loader::{load_layer, parse_poms, POM_FILE};
pub use workspace::{ProjectModel, Workspace, WorkspaceOptions};
