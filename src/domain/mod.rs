//! Domain models for Jarbird
//!
//! Repos, POMs, publications, project extensions and task naming, without
//! any I/O concerns.

pub mod naming;
mod property;
mod repo;
mod pom;
mod publication;
mod extension;

pub use property::{NoProperties, PropertyError, PropertyResolver, PropertySource, REPOSITORY_PREFIX};
pub use repo::{
    bintray_snapshot_of, maven_central_spec, Endpoint, RepoError, RepoKind, RepoSet, RepoSpec,
    RepoSpecBuilder,
};
pub use pom::{
    insert_version_tag, is_snapshot, License, Person, PluginInfo, Pom, PomError, PomGroup,
    PomLayer, PomResolver, ProjectInfo, Scm, Web,
};
pub use publication::{
    any_needs, ConfigError, Publication, SignWith, SigningPolicy, SourceSelector, VariantMode,
    NOT_A_PLUGIN,
};
pub use extension::{BintrayOrigin, Extension, PubScope, PubState, RepoDeclarations};
pub use naming::{NamingError, PubIdentity, TaskDescriptor};
