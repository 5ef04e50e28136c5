//! Publications
//!
//! A [`Publication`] is one publishable variant of a module: a resolved POM,
//! a signing policy, a source selector and the repos it was declared for.
//! It is finalized once, after which its repo set is frozen.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::naming::{capitalize, normalize_name, PubIdentity};
use super::pom::{insert_version_tag, Pom, PomError};
use super::repo::{bintray_snapshot_of, RepoError, RepoKind, RepoSet, RepoSpec};

/// Plugin coordinate of a publication that is not a Gradle plugin
pub const NOT_A_PLUGIN: &str = "NOT-A-PLUGIN";

/// Pub name used when the POM has no artifact id
pub const FALLBACK_PUB_NAME: &str = "Lib";

/// Errors raised while declaring or finalizing publications
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Variant '{0}' has been declared more than once")]
    DuplicateVariant(String),

    #[error("There can only be one configuration per sub-project for Artifactory server only.")]
    DuplicateArtifactory,

    #[error("Bintray repository has been declared at global level.")]
    BintrayDeclaredGlobally,

    #[error("Publication '{publication}' has an empty {field}")]
    EmptyCoordinate {
        publication: String,
        field: &'static str,
    },

    #[error("Plugin id is missing in the POM of publication '{0}'")]
    MissingPluginId(String),

    #[error("Plugin implementation class is missing in the POM of publication '{0}'")]
    MissingImplementationClass(String),

    #[error("Publishing '{0}' to Gradle Plugin Portal requires a website (web.url) in the POM")]
    PortalBundleMissing(String),

    #[error("Configuration of project '{0}' has already been finalized")]
    AlreadyFinalized(String),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Pom(#[from] PomError),
}

/// How the variant shows up in the published coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantMode {
    WithVersion,
    WithArtifactId,
    #[default]
    Invisible,
}

/// Which signing mechanism the publication asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignWith {
    /// Secret key ring file (`signing.keyId`, ...)
    #[default]
    Keyring,
    /// GnuPG agent (`signing.gnupg.keyName`, ...)
    Keybox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SigningPolicy {
    pub enabled: bool,
    pub sign_with: SignWith,
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            sign_with: SignWith::Keyring,
        }
    }
}

/// What the publication publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum SourceSelector {
    /// A software component, `java` by default
    Component(String),
    /// The jar of a source set
    SourceSet(String),
}

impl Default for SourceSelector {
    fn default() -> Self {
        SourceSelector::Component("java".to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub variant: String,
    pub pom: Pom,
    pub pub_name: String,
    pub signing: SigningPolicy,
    pub variant_mode: VariantMode,
    pub source: SourceSelector,
    repos: RepoSet,
    inherited: RepoSet,
    #[serde(skip)]
    finalized: bool,
}

impl Publication {
    /// Creates a publication for `variant` ("" for none)
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            pom: Pom::default(),
            pub_name: String::new(),
            signing: SigningPolicy::default(),
            variant_mode: VariantMode::default(),
            source: SourceSelector::default(),
            repos: RepoSet::new(),
            inherited: RepoSet::new(),
            finalized: false,
        }
    }

    /// Sets the POM and derives a pub name that no publication in `others`
    /// with the same variant already uses
    pub fn init(&mut self, pom: Pom, others: &[Publication]) {
        let proposed = match pom.artifact_id.as_deref() {
            Some(id) if !id.is_empty() => normalize_name(id),
            _ => normalize_name(FALLBACK_PUB_NAME),
        };
        self.pom = pom;
        self.pub_name = resolve_duplicated_name(others, &proposed, &self.variant);
        debug!(pub_name = %self.pub_name, variant = %self.variant, "initialized publication");
    }

    pub fn identity(&self) -> PubIdentity {
        PubIdentity::new(self.pub_name.clone(), self.variant.clone())
    }

    pub fn pub_name_with_variant(&self) -> String {
        self.identity().name_with_variant()
    }

    pub fn marker_pub_name(&self) -> String {
        self.identity().marker_name()
    }

    pub fn is_gradle_plugin(&self) -> bool {
        self.pom.is_gradle_plugin()
    }

    pub fn is_snapshot(&self) -> bool {
        self.pom.is_snapshot()
    }

    /// Artifact id with the variant appended in `WithArtifactId` mode
    pub fn variant_artifact_id(&self) -> String {
        let id = self.pom.artifact_id();
        if self.variant_mode == VariantMode::WithArtifactId && !self.variant.is_empty() {
            format!("{}-{}", id, self.variant)
        } else {
            id.to_string()
        }
    }

    /// Version with the variant inserted in `WithVersion` mode
    pub fn variant_version(&self) -> String {
        let version = self.pom.version();
        if self.variant_mode == VariantMode::WithVersion && !self.variant.is_empty() {
            insert_version_tag(version, &self.variant)
        } else {
            version.to_string()
        }
    }

    pub fn gav(&self) -> String {
        format!(
            "{}:{}:{}",
            self.pom.group(),
            self.variant_artifact_id(),
            self.variant_version()
        )
    }

    pub fn plugin_coordinate(&self) -> String {
        match (&self.pom.plugin, self.pom.plugin_id()) {
            (Some(_), Some(id)) => format!("{}:{}", id, self.variant_version()),
            (Some(_), None) => format!(":{}", self.variant_version()),
            _ => NOT_A_PLUGIN.to_string(),
        }
    }

    /// Adds a repo to the publication's own set
    pub fn add_repo(&mut self, repo: RepoSpec) -> bool {
        self.repos.insert(repo)
    }

    /// Repos declared directly on this publication
    pub fn own_repos(&self) -> &RepoSet {
        &self.repos
    }

    /// Active repos: own, then extension level, then parent extension level
    pub fn repos(&self) -> RepoSet {
        self.repos.union(&self.inherited)
    }

    pub fn needs(&self, kind: RepoKind) -> bool {
        self.repos.has_kind(kind) || self.inherited.has_kind(kind)
    }

    /// True if any non-local Maven repo is targeted
    pub fn needs_maven(&self) -> bool {
        self.repos.has_maven() || self.inherited.has_maven()
    }

    pub fn needs_artifactory(&self) -> bool {
        self.repos.has_artifactory() || self.inherited.has_artifactory()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Freezes the repo set and validates the publication
    ///
    /// `inherited` is the union of the extension level repos and those of
    /// the parent extension.
    pub fn finalize(&mut self, inherited: RepoSet) -> Result<(), ConfigError> {
        let label = self.pub_name_with_variant();

        for (field, value) in [
            ("group", self.pom.group()),
            ("artifactId", self.pom.artifact_id()),
            ("version", self.pom.version()),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyCoordinate {
                    publication: label,
                    field,
                });
            }
        }

        self.inherited = inherited;

        if self.is_snapshot() {
            let snapshot_sink = self
                .repos()
                .find_kind(RepoKind::Bintray)
                .and_then(bintray_snapshot_of);
            if let Some(sink) = snapshot_sink {
                debug!(publication = %label, "snapshot publication goes to OSS JFrog instead of Bintray");
                self.repos.insert(sink);
            }
        }

        if let Some(plugin) = &self.pom.plugin {
            if self.pom.plugin_id().is_none() {
                return Err(ConfigError::MissingPluginId(label));
            }
            if plugin
                .implementation_class
                .as_deref()
                .map_or(true, str::is_empty)
            {
                return Err(ConfigError::MissingImplementationClass(label));
            }
            if self.pom.web.url.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::PortalBundleMissing(label));
            }
            self.repos.insert(RepoSpec::GradlePortal);
        }

        self.finalized = true;
        debug!(
            publication = %label,
            repos = %self.repos().iter().map(|r| r.id()).collect::<Vec<_>>().join(","),
            "finalized publication"
        );
        Ok(())
    }
}

/// Appends 1, 2, ... to `proposed` until no publication of the same variant uses it
pub fn resolve_duplicated_name(others: &[Publication], proposed: &str, variant: &str) -> String {
    let target = |name: &str| format!("{}{}", name, capitalize(variant));
    let taken = |name: &str| {
        others
            .iter()
            .any(|p| p.pub_name_with_variant() == target(name))
    };

    let mut candidate = proposed.to_string();
    let mut index = 1;
    while taken(&candidate) {
        candidate = format!("{proposed}{index}");
        index += 1;
    }
    candidate
}

/// True if any publication satisfies `pred`
pub fn any_needs(pubs: &[Publication], pred: impl Fn(&Publication) -> bool) -> bool {
    pubs.iter().any(pred)
}
