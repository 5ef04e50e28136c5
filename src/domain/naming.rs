//! Task naming
//!
//! Pure functions composing task descriptors for the two prefixes in play:
//! `jbPublish` for the aggregate tasks we own, and `publish` for the tasks
//! the native publishing plugin creates. Both are derived from the same
//! [`PubIdentity`] and repo ids so `dependsOn` edges line up.
//!
//! Composition is always `<prefix><PubToken>To<Dest>`, `<prefix>To<Dest>`,
//! `<prefix><PubToken>` or `<prefix>` alone.

use serde::Serialize;
use thiserror::Error;

use super::repo::{RepoKind, RepoSet, RepoSpec};

pub const JB_TASK_PREFIX: &str = "jbPublish";
pub const PUBLISH_TASK_PREFIX: &str = "publish";
pub const PLUGIN_MARKER_PUB_SUFFIX: &str = "PluginMarkerMaven";

pub const JB_GROUP: &str = "Jarbird publishing";
pub const PUBLISHING_GROUP: &str = "publishing";
pub const DOCUMENTATION_GROUP: &str = "documentation";

pub const PUBLISH_PLUGINS_TASK: &str = "publishPlugins";
pub const ARTIFACTORY_PUBLISH_TASK: &str = "artifactoryPublish";
pub const BINTRAY_UPLOAD_TASK: &str = "bintrayUpload";

#[derive(Debug, Error, PartialEq)]
pub enum NamingError {
    #[error("Publication '{0}' does not declare Maven Central as a repository")]
    NoMavenCentral(String),
}

/// Uppercases the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns an arbitrary string into a camel-case identifier
///
/// Non-alphanumeric characters separate words. The first word starts in
/// lowercase, later words start in uppercase, the rest is kept as is.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut new_word = true;
    let mut first_word = true;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if new_word {
                if first_word {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                new_word = false;
            } else {
                out.push(c);
                first_word = false;
            }
        } else {
            new_word = true;
        }
    }

    out
}

/// Joins items as "a", "a and b", "a, b and c"
pub fn join_and<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Naming identity of a publication
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PubIdentity {
    pub pub_name: String,
    pub variant: String,
}

impl PubIdentity {
    pub fn new(pub_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            pub_name: pub_name.into(),
            variant: variant.into(),
        }
    }

    /// `abc` + `var` gives `abcVar`; this is the native publication name
    pub fn name_with_variant(&self) -> String {
        format!("{}{}", self.pub_name, capitalize(&self.variant))
    }

    /// Name of the plugin marker publication
    pub fn marker_name(&self) -> String {
        format!("{}{}", self.name_with_variant(), PLUGIN_MARKER_PUB_SUFFIX)
    }

    pub fn token(&self) -> String {
        capitalize(&self.name_with_variant())
    }

    pub fn marker_token(&self) -> String {
        capitalize(&self.marker_name())
    }

    fn label(&self) -> String {
        if self.variant.is_empty() {
            format!("module '{}'", self.pub_name)
        } else {
            format!("module '{}' ({})", self.pub_name, self.variant)
        }
    }
}

/// Which publications a task covers
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    All,
    Pub(&'a PubIdentity),
    Marker(&'a PubIdentity),
}

impl Subject<'_> {
    fn token(&self) -> String {
        match self {
            Subject::All => String::new(),
            Subject::Pub(id) => id.token(),
            Subject::Marker(id) => id.marker_token(),
        }
    }

    fn label(&self) -> Option<String> {
        match self {
            Subject::All => None,
            Subject::Pub(id) => Some(id.label()),
            Subject::Marker(id) => Some(format!("plugin marker of {}", id.label())),
        }
    }
}

/// Destination of a `jbPublish` task
#[derive(Debug, Clone, Copy)]
pub enum Destination<'a> {
    MavenLocal,
    /// One non-local Maven repository
    Repo(&'a RepoSpec),
    /// Every non-local Maven repository
    MavenRepositories,
    GradlePortal,
    Artifactory,
    Bintray,
}

impl<'a> Destination<'a> {
    /// Destination a repo spec publishes through
    pub fn of(repo: &'a RepoSpec) -> Self {
        match repo.kind() {
            RepoKind::MavenLocal => Destination::MavenLocal,
            RepoKind::MavenCentral | RepoKind::Maven => Destination::Repo(repo),
            RepoKind::Artifactory | RepoKind::BintraySnapshot => Destination::Artifactory,
            RepoKind::GradlePortal => Destination::GradlePortal,
            RepoKind::Bintray => Destination::Bintray,
        }
    }

    /// The Maven Central repo of `repos`
    ///
    /// Asking for Maven Central when the publication does not target it is a
    /// configuration error rather than something to skip silently.
    pub fn maven_central(publication: &str, repos: &'a RepoSet) -> Result<Self, NamingError> {
        repos
            .find_kind(RepoKind::MavenCentral)
            .map(Destination::Repo)
            .ok_or_else(|| NamingError::NoMavenCentral(publication.to_string()))
    }

    fn token(&self) -> String {
        match self {
            Destination::MavenLocal => "MavenLocal".to_string(),
            Destination::Repo(repo) => repo.repo_name(),
            Destination::MavenRepositories => "MavenRepositories".to_string(),
            Destination::GradlePortal => "GradlePluginPortal".to_string(),
            Destination::Artifactory => "Artifactory".to_string(),
            Destination::Bintray => "Bintray".to_string(),
        }
    }

    fn label(&self) -> String {
        match self {
            Destination::MavenLocal => "Maven Local repository".to_string(),
            Destination::Repo(repo) => repo.description().to_string(),
            Destination::MavenRepositories => "all Maven repositories".to_string(),
            Destination::GradlePortal => "Gradle Plugin Portal".to_string(),
            Destination::Artifactory => "Artifactory".to_string(),
            Destination::Bintray => "Bintray".to_string(),
        }
    }
}

/// Destination of a native publish task
#[derive(Debug, Clone, Copy)]
pub enum NativeDest<'a> {
    MavenLocal,
    Repo(&'a RepoSpec),
}

impl NativeDest<'_> {
    fn token(&self) -> String {
        match self {
            NativeDest::MavenLocal => "MavenLocal".to_string(),
            NativeDest::Repo(repo) => format!("{}Repository", repo.repo_name()),
        }
    }

    fn label(&self) -> String {
        match self {
            NativeDest::MavenLocal => "the local Maven repository".to_string(),
            NativeDest::Repo(repo) => format!("Maven repository '{}'", repo.repo_name()),
        }
    }
}

/// Identity of a registered task; two descriptors are the same task iff
/// all three fields match
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskDescriptor {
    pub group: String,
    pub name: String,
    pub description: String,
}

impl TaskDescriptor {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Composes a `jbPublish` task descriptor
pub fn jb_publish(subject: Subject<'_>, dest: Option<Destination<'_>>) -> TaskDescriptor {
    let mut name = format!("{}{}", JB_TASK_PREFIX, subject.token());
    let mut fragments = vec!["Publish".to_string()];

    if let Some(label) = subject.label() {
        fragments.push(label);
    }

    match dest {
        Some(dest) => {
            name.push_str("To");
            name.push_str(&dest.token());
            fragments.push(format!("to {}", dest.label()));
        }
        None => {
            if !matches!(subject, Subject::All) {
                fragments.push("to all targeted repositories".to_string());
            }
        }
    }

    TaskDescriptor::new(JB_GROUP, name, fragments.join(" "))
}

/// Composes the descriptor of a task the native publishing plugin creates
pub fn publish(subject: Subject<'_>, dest: Option<NativeDest<'_>>) -> TaskDescriptor {
    let mut name = PUBLISH_TASK_PREFIX.to_string();
    let what = match subject {
        Subject::All => "all publications produced by this project".to_string(),
        Subject::Pub(id) => {
            name.push_str(&id.token());
            name.push_str("Publication");
            format!("Maven publication '{}'", id.name_with_variant())
        }
        Subject::Marker(id) => {
            name.push_str(&id.marker_token());
            name.push_str("Publication");
            format!("Maven publication '{}'", id.marker_name())
        }
    };

    let description = match dest {
        Some(dest) => {
            name.push_str("To");
            name.push_str(&dest.token());
            format!("Publishes {} to {}", what, dest.label())
        }
        None => format!("Publishes {}", what),
    };

    TaskDescriptor::new(PUBLISHING_GROUP, name, description)
}

/// Jar task assembling the generated docs of a publication
pub fn dokka_jar(id: &PubIdentity) -> TaskDescriptor {
    TaskDescriptor::new(
        DOCUMENTATION_GROUP,
        format!("jbDokkaJar{}", id.token()),
        "Assembles Kotlin docs with Dokka to Jar",
    )
}

/// Jar task archiving the sources of a publication
pub fn sources_jar(id: &PubIdentity) -> TaskDescriptor {
    let description = if id.variant.is_empty() {
        "Create archive of source code for the binary".to_string()
    } else {
        format!(
            "Create archive of source code for the binary of variant '{}'",
            id.variant
        )
    };
    TaskDescriptor::new(
        PUBLISHING_GROUP,
        format!("sourcesJar{}", id.token()),
        description,
    )
}

/// Native task of a third-party publishing plugin, e.g. `publishPlugins`
pub fn native_task(name: &str, description: &str) -> TaskDescriptor {
    TaskDescriptor::new(PUBLISHING_GROUP, name, description)
}
