//! Task graph synthesis
//!
//! The registry models per-project task containers. The builders in this
//! module turn finalized publications into the `jbPublish` task tree on top
//! of the native tasks registered by [`PublishingModel`].

mod registry;
mod publishing;
mod filter;
mod maven;
mod portal;
mod artifactory;
mod bintray;
mod builder;
mod signing;
mod docs;
mod plugin;

#[cfg(test)]
mod testing;

use thiserror::Error;

use crate::domain::RepoError;

pub use registry::{
    split_path, task_path, PlanError, PlannedTask, PublishBinding, RegistrationMode, Task,
    TaskConfig, TaskContainer, TaskError, TaskGraph, TaskTree, ROOT_PROJECT,
};
pub use publishing::{NativePublication, NativeRepository, PublishingModel};
pub use filter::is_wanted_combination;
pub use maven::MavenTaskBuilder;
pub use portal::PortalTaskBuilder;
pub use artifactory::{artifactory_publish_task, ArtifactoryModel, ArtifactoryTaskBuilder};
pub use bintray::{BintrayPublishPlan, BintrayTaskBuilder};
pub use builder::TaskBuilder;
pub use signing::{PubSigning, SigningDecision, SigningPlan, SigningProperties, SkipReason};
pub use docs::DocsBuilder;
pub use plugin::{PluginEntry, PluginPublishingModel};

/// Errors raised while building the task graph of a project
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("Component published to Artifactory must be all release or all snapshot.")]
    MixedArtifactoryVersions,

    #[error("Only one artifactory repo is supported in one project or sub-project.")]
    MultipleArtifactoryRepos,

    #[error("No publication of project '{0}' is a Gradle plugin")]
    NoPluginPublication(String),
}
