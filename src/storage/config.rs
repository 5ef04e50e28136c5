//! Workspace descriptor
//!
//! The build layout and the publishing declarations of every project are
//! read from `jarbird.toml` at the workspace root:
//!
//! ```toml
//! [settings]
//! registration = "lazy"
//!
//! [[project]]
//! path = ":lib"
//! group = "io.example"
//! version = "1.0"
//! repos = { maven = ["mock"], maven_central = true }
//!
//! [[project.pub]]
//! variant = "debug"
//! repos = { artifactory = "internal" }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{SignWith, VariantMode};
use crate::graph::{RegistrationMode, ROOT_PROJECT};

/// File name of the workspace descriptor
pub const DESCRIPTOR_FILE: &str = "jarbird.toml";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid project path '{0}'. Paths start with ':', e.g. ':app'")]
    InvalidPath(String),

    #[error("Project '{0}' is declared more than once")]
    DuplicateProject(String),

    #[error("Project '{child}' is declared but its parent '{parent}' is not")]
    MissingParent { child: String, parent: String },

    #[error("Publication of project '{0}' selects both a component and a source set")]
    AmbiguousSource(String),

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Repository declarations at one scope
///
/// Fields are applied in declaration order of the struct: Maven Central,
/// custom Maven repos, Maven Local, the portal, Artifactory, then Bintray.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepoDecl {
    pub maven_central: bool,
    /// Keys of `repository.maven.<key>.*`
    pub maven: Vec<String>,
    pub maven_local: bool,
    pub gradle_portal: bool,
    /// Key of `repository.artifactory.<key>.*`
    pub artifactory: Option<String>,
    pub bintray: bool,
}

impl RepoDecl {
    pub fn is_empty(&self) -> bool {
        *self == RepoDecl::default()
    }
}

/// Workspace-wide settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// When task configuration runs
    pub registration: RegistrationMode,

    /// Repos every project starts with until it declares its own
    pub default_repos: RepoDecl,
}

/// One `[[project.pub]]` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PubEntry {
    pub variant: String,
    pub variant_mode: Option<VariantMode>,
    pub signing: Option<bool>,
    pub sign_with: Option<SignWith>,
    pub component: Option<String>,
    pub source_set: Option<String>,
    pub repos: RepoDecl,
}

/// One `[[project]]` entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectEntry {
    pub path: String,
    /// Directory relative to the workspace root; derived from the path if unset
    pub dir: Option<PathBuf>,
    pub group: String,
    /// Project name; the last path segment if unset
    pub name: Option<String>,
    pub version: String,
    pub description: Option<String>,
    /// Task producing the API documentation
    pub doc_task: Option<String>,
    pub repos: RepoDecl,
    #[serde(rename = "pub")]
    pub pubs: Vec<PubEntry>,
}

impl ProjectEntry {
    /// Number of path segments, 0 for the root project
    pub fn depth(&self) -> usize {
        if self.path == ROOT_PROJECT {
            0
        } else {
            self.path.matches(':').count()
        }
    }

    pub fn parent_path(&self) -> Option<String> {
        if self.path == ROOT_PROJECT {
            return None;
        }
        match self.path.rfind(':') {
            Some(0) | None => Some(ROOT_PROJECT.to_string()),
            Some(idx) => Some(self.path[..idx].to_string()),
        }
    }

    pub fn dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None if self.path == ROOT_PROJECT => PathBuf::from("."),
            None => self.path.trim_start_matches(':').split(':').collect(),
        }
    }

    /// Project name, falling back to the last path segment
    pub fn name_or(&self, root_name: &str) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match self.path.rsplit(':').next() {
            Some(segment) if !segment.is_empty() => segment.to_string(),
            _ => root_name.to_string(),
        }
    }
}

/// Parsed `jarbird.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Descriptor {
    pub settings: Settings,
    #[serde(rename = "project")]
    pub projects: Vec<ProjectEntry>,
}

impl Descriptor {
    /// Parses and validates a descriptor
    ///
    /// A root project entry is added when the file has none, and projects
    /// are sorted parents first.
    pub fn parse(content: &str, path: &Path) -> Result<Self, DescriptorError> {
        let mut descriptor: Descriptor =
            toml::from_str(content).map_err(|e| DescriptorError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        descriptor.normalize()?;
        Ok(descriptor)
    }

    /// Loads `jarbird.toml` from a workspace root
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(DESCRIPTOR_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read workspace descriptor: {}", path.display()))?;
        Self::parse(&content, &path).map_err(Into::into)
    }

    fn normalize(&mut self) -> Result<(), DescriptorError> {
        let mut seen = HashSet::new();
        for project in &self.projects {
            let valid = project.path == ROOT_PROJECT
                || (project.path.starts_with(':')
                    && project.path[1..].split(':').all(|s| !s.is_empty()));
            if !valid {
                return Err(DescriptorError::InvalidPath(project.path.clone()));
            }
            if !seen.insert(project.path.clone()) {
                return Err(DescriptorError::DuplicateProject(project.path.clone()));
            }
            if project
                .pubs
                .iter()
                .any(|p| p.component.is_some() && p.source_set.is_some())
            {
                return Err(DescriptorError::AmbiguousSource(project.path.clone()));
            }
        }

        if !seen.contains(ROOT_PROJECT) {
            self.projects.push(ProjectEntry {
                path: ROOT_PROJECT.to_string(),
                ..ProjectEntry::default()
            });
            seen.insert(ROOT_PROJECT.to_string());
        }

        for project in &self.projects {
            if let Some(parent) = project.parent_path() {
                if !seen.contains(&parent) {
                    return Err(DescriptorError::MissingParent {
                        child: project.path.clone(),
                        parent,
                    });
                }
            }
        }

        self.projects.sort_by_key(ProjectEntry::depth);
        Ok(())
    }

    pub fn project(&self, path: &str) -> Option<&ProjectEntry> {
        self.projects.iter().find(|p| p.path == path)
    }

    /// True if some project other than the root is declared
    pub fn is_multi_project(&self) -> bool {
        self.projects.iter().any(|p| p.path != ROOT_PROJECT)
    }

    /// Finds the workspace root by looking for `jarbird.toml` upwards
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(DESCRIPTOR_FILE).is_file() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// User-level properties file, `gradle.properties` in the config dir
    pub fn user_properties_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "jarbird", "jarbird")
            .map(|dirs| dirs.config_dir().join("gradle.properties"))
    }
}
