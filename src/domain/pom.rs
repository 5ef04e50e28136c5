//! POM metadata
//!
//! A [`Pom`] is the artifact metadata read from `pom.yaml` documents. A
//! [`PomGroup`] holds one document per variant, in layers from lowest to
//! highest precedence (root project first), and resolves the merged POM of
//! a variant.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

#[derive(Debug, Error, PartialEq)]
pub enum PomError {
    #[error("Variant '{0}' is not found")]
    VariantNotFound(String),

    #[error("POM with default variant has already existed")]
    DuplicateDefault,

    #[error("POM with variant '{0}' has already existed")]
    DuplicateVariant(String),
}

/// Returns true if the version is a snapshot version
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// Inserts `tag` before the snapshot suffix, or appends it
///
/// `1.0` becomes `1.0-debug`, `1.0-SNAPSHOT` becomes `1.0-debug-SNAPSHOT`.
pub fn insert_version_tag(version: &str, tag: &str) -> String {
    match version.strip_suffix(SNAPSHOT_SUFFIX) {
        Some(base) => format!("{base}-{tag}{SNAPSHOT_SUFFIX}"),
        None => format!("{version}-{tag}"),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct License {
    pub name: Option<String>,
    pub url: Option<String>,
    pub dist: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organization: Option<String>,
    pub organization_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Web {
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scm {
    pub url: Option<String>,
    pub connection: Option<String>,
    pub developer_connection: Option<String>,
    /// Host such as `github.com`; with `repo_name` the other fields can be derived
    pub repo_type: Option<String>,
    /// `user/repo`
    pub repo_name: Option<String>,
    pub issue_type: Option<String>,
    pub issue_url: Option<String>,
    pub tag: Option<String>,
}

/// Gradle plugin metadata; its presence makes the artifact a plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginInfo {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub implementation_class: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pom {
    /// `None` for the default document
    pub variant: Option<String>,
    pub group: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub inception_year: Option<i32>,
    pub licenses: Vec<License>,
    pub developers: Vec<Person>,
    pub contributors: Vec<Person>,
    pub web: Web,
    pub scm: Scm,
    pub plugin: Option<PluginInfo>,
}

/// Project attributes used to fill in what the POM leaves out
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub group: String,
    pub version: String,
    pub description: Option<String>,
}

fn overlay_opt<T: Clone>(top: &Option<T>, base: &mut Option<T>) {
    if let Some(value) = top {
        *base = Some(value.clone());
    }
}

impl Pom {
    pub fn group(&self) -> &str {
        self.group.as_deref().unwrap_or_default()
    }

    pub fn artifact_id(&self) -> &str {
        self.artifact_id.as_deref().unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or_default()
    }

    pub fn is_snapshot(&self) -> bool {
        is_snapshot(self.version())
    }

    pub fn is_gradle_plugin(&self) -> bool {
        self.plugin.is_some()
    }

    /// Plugin id, if this is a plugin with a non-empty id
    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin
            .as_ref()
            .and_then(|p| p.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Copies every field set in `self` onto `base`
    ///
    /// Lists are replaced wholesale when `self` has entries.
    pub fn overlay_onto(&self, base: &mut Pom) {
        overlay_opt(&self.group, &mut base.group);
        overlay_opt(&self.artifact_id, &mut base.artifact_id);
        overlay_opt(&self.version, &mut base.version);
        overlay_opt(&self.packaging, &mut base.packaging);
        overlay_opt(&self.name, &mut base.name);
        overlay_opt(&self.description, &mut base.description);
        overlay_opt(&self.url, &mut base.url);
        overlay_opt(&self.inception_year, &mut base.inception_year);

        if !self.licenses.is_empty() {
            base.licenses = self.licenses.clone();
        }
        if !self.developers.is_empty() {
            base.developers = self.developers.clone();
        }
        if !self.contributors.is_empty() {
            base.contributors = self.contributors.clone();
        }

        overlay_opt(&self.web.url, &mut base.web.url);
        overlay_opt(&self.web.description, &mut base.web.description);

        overlay_opt(&self.scm.url, &mut base.scm.url);
        overlay_opt(&self.scm.connection, &mut base.scm.connection);
        overlay_opt(&self.scm.developer_connection, &mut base.scm.developer_connection);
        overlay_opt(&self.scm.repo_type, &mut base.scm.repo_type);
        overlay_opt(&self.scm.repo_name, &mut base.scm.repo_name);
        overlay_opt(&self.scm.issue_type, &mut base.scm.issue_type);
        overlay_opt(&self.scm.issue_url, &mut base.scm.issue_url);
        overlay_opt(&self.scm.tag, &mut base.scm.tag);

        if let Some(top) = &self.plugin {
            let target = base.plugin.get_or_insert_with(PluginInfo::default);
            overlay_opt(&top.id, &mut target.id);
            overlay_opt(&top.display_name, &mut target.display_name);
            overlay_opt(&top.description, &mut target.description);
            overlay_opt(&top.implementation_class, &mut target.implementation_class);
            if !top.tags.is_empty() {
                target.tags = top.tags.clone();
            }
        }
    }

    /// Fills missing coordinates and derived metadata from the project
    pub fn sync_with(&mut self, project: &ProjectInfo) {
        if self.group.is_none() && !project.group.is_empty() {
            self.group = Some(project.group.clone());
        }
        if self.artifact_id.is_none() && !project.name.is_empty() {
            self.artifact_id = Some(project.name.clone());
        }
        if self.version.is_none() && !project.version.is_empty() {
            self.version = Some(project.version.clone());
        }
        self.name = self.artifact_id.clone();
        self.packaging.get_or_insert_with(|| "jar".to_string());
        if self.description.is_none() {
            self.description = project.description.clone();
        }

        for license in &mut self.licenses {
            license.dist.get_or_insert_with(|| "repo".to_string());
        }

        self.expand_scm();

        if self.web.url.is_none() {
            self.web.url = self.scm.url.clone();
        }
        if self.web.description.is_none() {
            self.web.description = self.description.clone();
        }
        if self.url.is_none() {
            self.url = self.scm.url.clone();
        }
    }

    fn expand_scm(&mut self) {
        let scm = &mut self.scm;
        let (Some(host), Some(repo)) = (scm.repo_type.clone(), scm.repo_name.clone()) else {
            return;
        };

        scm.url.get_or_insert_with(|| format!("https://{host}/{repo}"));
        scm.connection
            .get_or_insert_with(|| format!("scm:git@{host}:{repo}"));
        scm.developer_connection
            .get_or_insert_with(|| format!("scm:git@{host}:{repo}.git"));
        scm.issue_type.get_or_insert_with(|| host.clone());
        scm.issue_url
            .get_or_insert_with(|| format!("https://{host}/{repo}/issues"));
    }
}

/// Resolves the merged POM of a variant
pub trait PomResolver {
    /// Returns the POM for `variant` ("" for the default one)
    fn resolve(&self, variant: &str) -> Result<Pom, PomError>;
}

/// One layer of POM documents keyed by variant ("" for the default)
#[derive(Debug, Clone, Default)]
pub struct PomLayer {
    docs: HashMap<String, Pom>,
}

impl PomLayer {
    /// Indexes documents by variant, rejecting duplicates
    pub fn new(poms: impl IntoIterator<Item = Pom>) -> Result<Self, PomError> {
        let mut docs = HashMap::new();
        for pom in poms {
            let variant = pom.variant.clone().unwrap_or_default();
            if docs.contains_key(&variant) {
                return Err(if variant.is_empty() {
                    PomError::DuplicateDefault
                } else {
                    PomError::DuplicateVariant(variant)
                });
            }
            docs.insert(variant, pom);
        }
        Ok(Self { docs })
    }

    pub fn get(&self, variant: &str) -> Option<&Pom> {
        self.docs.get(variant)
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Layered POM documents with project info applied on resolution
#[derive(Debug, Clone, Default)]
pub struct PomGroup {
    layers: Vec<PomLayer>,
    project: ProjectInfo,
}

impl PomGroup {
    /// Creates a group from layers ordered from lowest to highest precedence
    pub fn new(layers: Vec<PomLayer>, project: ProjectInfo) -> Self {
        Self { layers, project }
    }

    /// Returns true if any resolvable variant is a Gradle plugin
    pub fn involves_gradle_plugin(&self) -> bool {
        self.layers
            .iter()
            .flat_map(|layer| layer.docs.values())
            .any(Pom::is_gradle_plugin)
    }

    fn has_variant(&self, variant: &str) -> bool {
        self.layers.iter().any(|layer| layer.get(variant).is_some())
    }
}

impl PomResolver for PomGroup {
    fn resolve(&self, variant: &str) -> Result<Pom, PomError> {
        if !variant.is_empty() && !self.has_variant(variant) && !self.has_variant("") {
            return Err(PomError::VariantNotFound(variant.to_string()));
        }

        let mut pom = Pom::default();
        for layer in &self.layers {
            if let Some(doc) = layer.get("") {
                doc.overlay_onto(&mut pom);
            }
        }
        if !variant.is_empty() {
            for layer in &self.layers {
                if let Some(doc) = layer.get(variant) {
                    doc.overlay_onto(&mut pom);
                }
            }
        }

        pom.variant = (!variant.is_empty()).then(|| variant.to_string());
        pom.sync_with(&self.project);
        Ok(pom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pom(variant: Option<&str>, artifact_id: Option<&str>, version: Option<&str>) -> Pom {
        Pom {
            variant: variant.map(str::to_string),
            artifact_id: artifact_id.map(str::to_string),
            version: version.map(str::to_string),
            ..Pom::default()
        }
    }

    fn project() -> ProjectInfo {
        ProjectInfo {
            name: "app".to_string(),
            group: "io.example".to_string(),
            version: "1.0".to_string(),
            description: Some("An app".to_string()),
        }
    }

    #[test]
    fn snapshot_detection() {
        assert!(is_snapshot("1.0-SNAPSHOT"));
        assert!(!is_snapshot("1.0"));
        assert!(!is_snapshot(""));
    }

    #[test]
    fn version_tag_goes_before_snapshot() {
        assert_eq!(insert_version_tag("1.0", "debug"), "1.0-debug");
        assert_eq!(insert_version_tag("1.0-SNAPSHOT", "debug"), "1.0-debug-SNAPSHOT");
    }

    #[test]
    fn plugin_section_marks_gradle_plugin() {
        let mut p = Pom::default();
        assert!(!p.is_gradle_plugin());
        p.plugin = Some(PluginInfo::default());
        assert!(p.is_gradle_plugin());
        assert_eq!(p.plugin_id(), None);
    }

    #[test]
    fn sync_fills_from_project() {
        let mut p = Pom::default();
        p.sync_with(&project());

        assert_eq!(p.group(), "io.example");
        assert_eq!(p.artifact_id(), "app");
        assert_eq!(p.version(), "1.0");
        assert_eq!(p.packaging.as_deref(), Some("jar"));
        assert_eq!(p.description.as_deref(), Some("An app"));
    }

    #[test]
    fn sync_keeps_pom_values() {
        let mut p = pom(None, Some("lib"), Some("2.0"));
        p.sync_with(&project());

        assert_eq!(p.artifact_id(), "lib");
        assert_eq!(p.version(), "2.0");
        assert_eq!(p.name.as_deref(), Some("lib"));
    }

    #[test]
    fn scm_expands_from_repo_type_and_name() {
        let mut p = Pom::default();
        p.scm.repo_type = Some("github.com".to_string());
        p.scm.repo_name = Some("user/repo".to_string());
        p.sync_with(&project());

        assert_eq!(p.scm.url.as_deref(), Some("https://github.com/user/repo"));
        assert_eq!(p.scm.connection.as_deref(), Some("scm:git@github.com:user/repo"));
        assert_eq!(
            p.scm.issue_url.as_deref(),
            Some("https://github.com/user/repo/issues")
        );
        assert_eq!(p.web.url.as_deref(), Some("https://github.com/user/repo"));
        assert_eq!(p.url.as_deref(), Some("https://github.com/user/repo"));
    }

    #[test]
    fn duplicate_documents_are_rejected() {
        assert_eq!(
            PomLayer::new([pom(None, None, None), pom(None, None, None)]).unwrap_err(),
            PomError::DuplicateDefault
        );
        assert_eq!(
            PomLayer::new([pom(Some("debug"), None, None), pom(Some("debug"), None, None)])
                .unwrap_err(),
            PomError::DuplicateVariant("debug".to_string())
        );
    }

    #[test]
    fn variant_overlays_default_and_project_overlays_root() {
        let root = PomLayer::new([pom(None, Some("root-lib"), Some("1.0"))]).unwrap();
        let child = PomLayer::new([
            pom(None, Some("child-lib"), None),
            pom(Some("debug"), None, Some("1.1")),
        ])
        .unwrap();
        let group = PomGroup::new(vec![root, child], project());

        let default = group.resolve("").unwrap();
        assert_eq!(default.artifact_id(), "child-lib");
        assert_eq!(default.version(), "1.0");

        let debug = group.resolve("debug").unwrap();
        assert_eq!(debug.artifact_id(), "child-lib");
        assert_eq!(debug.version(), "1.1");
        assert_eq!(debug.variant.as_deref(), Some("debug"));
    }

    #[test]
    fn unknown_variant_falls_back_to_default() {
        let layer = PomLayer::new([pom(None, Some("lib"), None)]).unwrap();
        let group = PomGroup::new(vec![layer], project());

        assert_eq!(group.resolve("release").unwrap().artifact_id(), "lib");
    }

    #[test]
    fn unknown_variant_without_default_fails() {
        let layer = PomLayer::new([pom(Some("debug"), None, None)]).unwrap();
        let group = PomGroup::new(vec![layer], project());

        assert_eq!(
            group.resolve("release").unwrap_err(),
            PomError::VariantNotFound("release".to_string())
        );
    }

    #[test]
    fn empty_group_resolves_from_project() {
        let group = PomGroup::new(Vec::new(), project());
        assert_eq!(group.resolve("").unwrap().artifact_id(), "app");
    }
}
