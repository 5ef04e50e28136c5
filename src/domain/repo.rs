//! Publishing destinations
//!
//! A [`RepoSpec`] describes where a publication goes. Specs are immutable once
//! built; two specs of the same kind with the same `id` are the same repo,
//! which is what [`RepoSet`] deduplicates on.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::naming::{capitalize, normalize_name};
use super::property::{PropertyError, PropertyResolver, PropertySource};

pub const MAVEN_LOCAL_ID: &str = "MavenLocal";
pub const MAVEN_CENTRAL_ID: &str = "MavenCentral";
pub const GRADLE_PORTAL_ID: &str = "GradlePluginPortal";
pub const BINTRAY_ID: &str = "Bintray";
pub const OSS_SNAPSHOT_REPO_KEY: &str = "oss-snapshot-local";

const CENTRAL_NEW_HOST: &str = "https://s01.oss.sonatype.org";
const CENTRAL_OLD_HOST: &str = "https://oss.sonatype.org";

#[derive(Debug, Error, PartialEq)]
pub enum RepoError {
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("{kind} URL of the repo '{id}' is not provided")]
    MissingUrl { id: String, kind: &'static str },
}

/// Kind of a destination, used for "does anything need X" queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoKind {
    MavenLocal,
    MavenCentral,
    Maven,
    Artifactory,
    GradlePortal,
    Bintray,
    BintraySnapshot,
}

impl RepoKind {
    /// Non-local Maven repositories (custom repos and Maven Central)
    pub fn is_maven(self) -> bool {
        matches!(self, RepoKind::MavenCentral | RepoKind::Maven)
    }

    /// Destinations published through the Artifactory plugin
    pub fn is_artifactory(self) -> bool {
        matches!(self, RepoKind::Artifactory | RepoKind::BintraySnapshot)
    }

    pub fn label(self) -> &'static str {
        match self {
            RepoKind::MavenLocal => "maven-local",
            RepoKind::MavenCentral => "maven-central",
            RepoKind::Maven => "maven",
            RepoKind::Artifactory => "artifactory",
            RepoKind::GradlePortal => "gradle-portal",
            RepoKind::Bintray => "bintray",
            RepoKind::BintraySnapshot => "bintray-snapshot",
        }
    }
}

/// Network coordinates and credentials of a remote repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub id: String,
    pub description: String,
    pub release_url: String,
    pub snapshot_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub allow_insecure_protocol: bool,
}

impl Endpoint {
    /// URL to publish to, depending on whether the artifact is a snapshot
    pub fn effective_url(&self, snapshot: bool) -> Result<&str, RepoError> {
        let (url, kind) = if snapshot {
            (&self.snapshot_url, "Snapshot")
        } else {
            (&self.release_url, "Release")
        };

        if url.is_empty() {
            return Err(RepoError::MissingUrl {
                id: self.id.clone(),
                kind,
            });
        }
        Ok(url)
    }
}

/// A publishing destination
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepoSpec {
    MavenLocal,
    MavenCentral {
        #[serde(flatten)]
        endpoint: Endpoint,
        new_user: bool,
    },
    Maven {
        key: String,
        #[serde(flatten)]
        endpoint: Endpoint,
    },
    Artifactory {
        key: String,
        repo_key: String,
        #[serde(flatten)]
        endpoint: Endpoint,
    },
    GradlePortal,
    Bintray {
        #[serde(flatten)]
        endpoint: Endpoint,
        #[serde(skip_serializing)]
        apikey: String,
    },
    /// Artifactory-shaped sink for snapshots of Bintray publications
    BintraySnapshot {
        repo_key: String,
        #[serde(flatten)]
        endpoint: Endpoint,
    },
}

impl RepoSpec {
    pub fn kind(&self) -> RepoKind {
        match self {
            RepoSpec::MavenLocal => RepoKind::MavenLocal,
            RepoSpec::MavenCentral { .. } => RepoKind::MavenCentral,
            RepoSpec::Maven { .. } => RepoKind::Maven,
            RepoSpec::Artifactory { .. } => RepoKind::Artifactory,
            RepoSpec::GradlePortal => RepoKind::GradlePortal,
            RepoSpec::Bintray { .. } => RepoKind::Bintray,
            RepoSpec::BintraySnapshot { .. } => RepoKind::BintraySnapshot,
        }
    }

    /// Token used in task and repository names
    pub fn id(&self) -> &str {
        match self {
            RepoSpec::MavenLocal => MAVEN_LOCAL_ID,
            RepoSpec::GradlePortal => GRADLE_PORTAL_ID,
            RepoSpec::MavenCentral { endpoint, .. }
            | RepoSpec::Maven { endpoint, .. }
            | RepoSpec::Artifactory { endpoint, .. }
            | RepoSpec::Bintray { endpoint, .. }
            | RepoSpec::BintraySnapshot { endpoint, .. } => &endpoint.id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            RepoSpec::MavenLocal => "Maven Local repository",
            RepoSpec::GradlePortal => "Gradle Plugin Portal",
            RepoSpec::MavenCentral { endpoint, .. }
            | RepoSpec::Maven { endpoint, .. }
            | RepoSpec::Artifactory { endpoint, .. }
            | RepoSpec::Bintray { endpoint, .. }
            | RepoSpec::BintraySnapshot { endpoint, .. } => &endpoint.description,
        }
    }

    /// Remote endpoint, `None` for Maven Local and the plugin portal
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            RepoSpec::MavenLocal | RepoSpec::GradlePortal => None,
            RepoSpec::MavenCentral { endpoint, .. }
            | RepoSpec::Maven { endpoint, .. }
            | RepoSpec::Artifactory { endpoint, .. }
            | RepoSpec::Bintray { endpoint, .. }
            | RepoSpec::BintraySnapshot { endpoint, .. } => Some(endpoint),
        }
    }

    /// Name the native publishing plugin gives the repository
    pub fn repo_name(&self) -> String {
        capitalize(self.id())
    }

    pub fn is_maven(&self) -> bool {
        self.kind().is_maven()
    }

    pub fn is_artifactory(&self) -> bool {
        self.kind().is_artifactory()
    }
}

impl PartialEq for RepoSpec {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl Eq for RepoSpec {}

impl Hash for RepoSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.id().hash(state);
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.kind().label())
    }
}

/// Insertion-ordered set of repos, deduplicated by kind and id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepoSet(Vec<RepoSpec>);

impl RepoSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a repo, returning false if an equal repo is already present
    pub fn insert(&mut self, repo: RepoSpec) -> bool {
        if self.0.contains(&repo) {
            false
        } else {
            self.0.push(repo);
            true
        }
    }

    /// Adds every repo of `other` that is not already present
    pub fn extend_from(&mut self, other: &RepoSet) {
        for repo in other.iter() {
            self.insert(repo.clone());
        }
    }

    /// Returns a new set with the repos of both, `self` first
    pub fn union(&self, other: &RepoSet) -> RepoSet {
        let mut merged = self.clone();
        merged.extend_from(other);
        merged
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, repo: &RepoSpec) -> bool {
        self.0.contains(repo)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RepoSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First repo of the given kind
    pub fn find_kind(&self, kind: RepoKind) -> Option<&RepoSpec> {
        self.0.iter().find(|r| r.kind() == kind)
    }

    pub fn has_kind(&self, kind: RepoKind) -> bool {
        self.find_kind(kind).is_some()
    }

    /// Non-local Maven repos, in declaration order
    pub fn maven_repos(&self) -> impl Iterator<Item = &RepoSpec> {
        self.0.iter().filter(|r| r.is_maven())
    }

    pub fn has_maven(&self) -> bool {
        self.0.iter().any(RepoSpec::is_maven)
    }

    pub fn has_artifactory(&self) -> bool {
        self.0.iter().any(RepoSpec::is_artifactory)
    }
}

impl<'a> IntoIterator for &'a RepoSet {
    type Item = &'a RepoSpec;
    type IntoIter = std::slice::Iter<'a, RepoSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<RepoSpec> for RepoSet {
    fn from_iter<I: IntoIterator<Item = RepoSpec>>(iter: I) -> Self {
        let mut set = RepoSet::new();
        for repo in iter {
            set.insert(repo);
        }
        set
    }
}

/// Builds repo specs from `repository.*` properties
pub struct RepoSpecBuilder<'a> {
    properties: &'a dyn PropertySource,
}

impl<'a> RepoSpecBuilder<'a> {
    pub fn new(properties: &'a dyn PropertySource) -> Self {
        Self { properties }
    }

    pub fn maven_local(&self) -> RepoSpec {
        RepoSpec::MavenLocal
    }

    pub fn gradle_portal(&self) -> RepoSpec {
        RepoSpec::GradlePortal
    }

    /// Custom Maven repository configured under `repository.maven.<key>`
    pub fn maven_repo(&self, key: &str) -> Result<RepoSpec, RepoError> {
        let scope = format!("maven.{key}");
        let props = PropertyResolver::new(self.properties, scope.as_str());

        Ok(RepoSpec::Maven {
            key: key.to_string(),
            endpoint: Endpoint {
                id: capitalize(&normalize_name(&scope)),
                description: props.optional("description", &format!("Maven repository '{key}'")),
                release_url: props.required("release")?,
                snapshot_url: props.optional("snapshot", ""),
                username: props.optional("username", ""),
                password: props.optional("password", ""),
                allow_insecure_protocol: props.optional("allowInsecureProtocol", "false") == "true",
            },
        })
    }

    /// Maven Central (OSSRH) configured under `repository.mavencentral`
    pub fn maven_central(&self) -> RepoSpec {
        let props = PropertyResolver::new(self.properties, "mavencentral");

        let new_user = match props.lookup("newUser") {
            Some(value) => value.trim() != "false",
            None => {
                warn!(
                    "OSSRH user has not been specified to be new or old. If the account was created \
                     before February 2021 it is an old account; add 'repository.mavencentral.newUser=false'. \
                     Otherwise a new account is assumed."
                );
                true
            }
        };

        let username = props.optional("username", "");
        if username.is_empty() {
            warn!("Maven Central username is not found");
        }
        let password = props.optional("password", "");
        if password.is_empty() {
            warn!("Maven Central password is not found");
        }

        maven_central_spec(username, password, new_user)
    }

    /// Artifactory server configured under `repository.artifactory.<key>`
    pub fn artifactory(&self, key: &str) -> Result<RepoSpec, RepoError> {
        let scope = format!("artifactory.{key}");
        let props = PropertyResolver::new(self.properties, scope.as_str());

        Ok(RepoSpec::Artifactory {
            key: key.to_string(),
            repo_key: props.required("repoKey")?,
            endpoint: Endpoint {
                id: capitalize(&normalize_name(&scope)),
                description: props.optional("description", "Artifactory"),
                release_url: props.required("release")?,
                snapshot_url: props.required("snapshot")?,
                username: props.optional("username", ""),
                password: props.optional("password", ""),
                allow_insecure_protocol: props.optional("allowInsecureProtocol", "false") == "true",
            },
        })
    }

    /// Legacy Bintray configured under `repository.bintray`
    pub fn bintray(&self) -> Result<RepoSpec, RepoError> {
        let props = PropertyResolver::new(self.properties, "bintray");

        Ok(RepoSpec::Bintray {
            apikey: props.required("apikey")?,
            endpoint: Endpoint {
                id: BINTRAY_ID.to_string(),
                description: props.optional("description", "Bintray"),
                // the Bintray plugin fills in the release URL when we leave it empty
                release_url: props.optional("release", ""),
                snapshot_url: props.optional("snapshot", "https://oss.jfrog.org"),
                username: props.required("username")?,
                password: String::new(),
                allow_insecure_protocol: false,
            },
        })
    }
}

/// Maven Central spec for the given OSSRH account
pub fn maven_central_spec(username: String, password: String, new_user: bool) -> RepoSpec {
    let host = if new_user {
        CENTRAL_NEW_HOST
    } else {
        CENTRAL_OLD_HOST
    };

    RepoSpec::MavenCentral {
        endpoint: Endpoint {
            id: MAVEN_CENTRAL_ID.to_string(),
            description: "Maven Central".to_string(),
            release_url: format!("{host}/service/local/staging/deploy/maven2"),
            snapshot_url: format!("{host}/content/repositories/snapshots"),
            username,
            password,
            allow_insecure_protocol: false,
        },
        new_user,
    }
}

/// Derives the OSS snapshot sink of a Bintray spec
///
/// Returns `None` when `bintray` is not a Bintray spec.
pub fn bintray_snapshot_of(bintray: &RepoSpec) -> Option<RepoSpec> {
    match bintray {
        RepoSpec::Bintray { endpoint, apikey } => Some(RepoSpec::BintraySnapshot {
            repo_key: OSS_SNAPSHOT_REPO_KEY.to_string(),
            endpoint: Endpoint {
                id: endpoint.id.clone(),
                description: "Artifactory OSS Snapshot".to_string(),
                release_url: String::new(),
                snapshot_url: endpoint.snapshot_url.clone(),
                username: endpoint.username.clone(),
                password: apikey.clone(),
                allow_insecure_protocol: endpoint.allow_insecure_protocol,
            },
        }),
        _ => None,
    }
}
