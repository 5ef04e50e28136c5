//! The `jbPublish` task tree of one project
//!
//! ```text
//! jbPublish
//!   jbPublishToMavenLocal
//!   jbPublishToMavenRepositories
//!   jbPublishToGradlePluginPortal
//!   jbPublishToArtifactory
//!   jbPublishToBintray
//! jbPublish<Pub>
//!   jbPublish<Pub>ToMavenLocal
//!   jbPublish<Pub>ToMavenRepositories
//!   jbPublish<Pub>ToGradlePluginPortal
//! ```
//!
//! A multi-project root registers the same names, each depending on the
//! tasks of its children. Children must be built first in eager mode.

use tracing::debug;

use crate::domain::naming::{self, Destination, Subject};
use crate::domain::{Publication, RepoKind};

use super::artifactory::ArtifactoryTaskBuilder;
use super::bintray::BintrayTaskBuilder;
use super::maven::MavenTaskBuilder;
use super::portal::PortalTaskBuilder;
use super::registry::{TaskError, TaskGraph};

pub struct TaskBuilder<'a> {
    project: &'a str,
    pubs: &'a [Publication],
}

impl<'a> TaskBuilder<'a> {
    pub fn new(project: &'a str, pubs: &'a [Publication]) -> Self {
        Self { project, pubs }
    }

    /// Registers every `jbPublish` task of the project
    pub fn build(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        debug!(project = %self.project, pubs = self.pubs.len(), "building publishing tasks");

        let maven = MavenTaskBuilder::new(self.project, self.pubs);
        maven.register_maven_local(graph)?;
        maven.register_maven_repositories(graph)?;
        PortalTaskBuilder::new(self.project, self.pubs).register(graph)?;
        ArtifactoryTaskBuilder::new(self.project, self.pubs).register(graph)?;
        BintrayTaskBuilder::new(self.project, self.pubs).register(graph)?;

        self.register_pub_tasks(graph)?;
        self.register_root_task(graph)
    }

    fn register_pub_tasks(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let multi_project_root = graph.is_multi_project_root(self.project);

        for publication in self.pubs {
            let id = publication.identity();
            let descriptor = naming::jb_publish(Subject::Pub(&id), None);

            if multi_project_root {
                graph.register_delegate(self.project, descriptor)?;
                continue;
            }

            let mut deps = Vec::new();
            if publication.needs(RepoKind::MavenLocal) {
                deps.push(naming::jb_publish(Subject::Pub(&id), Some(Destination::MavenLocal)).name);
            }
            if publication.needs_maven() {
                deps.push(
                    naming::jb_publish(Subject::Pub(&id), Some(Destination::MavenRepositories)).name,
                );
            }
            let portal = naming::jb_publish(Subject::Pub(&id), Some(Destination::GradlePortal)).name;
            if graph.has_task(self.project, &portal) {
                deps.push(portal);
            }

            graph.register(self.project, descriptor, move |task| {
                for name in deps {
                    task.depends_on(name);
                }
            })?;
        }
        Ok(())
    }

    fn register_root_task(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let root = naming::jb_publish(Subject::All, None);
        let mut deps = Vec::new();
        for dest in [
            Destination::MavenLocal,
            Destination::MavenRepositories,
            Destination::GradlePortal,
            Destination::Artifactory,
            Destination::Bintray,
        ] {
            let name = naming::jb_publish(Subject::All, Some(dest)).name;
            if graph.has_task(self.project, &name) {
                deps.push(name);
            }
        }

        let delegate = graph.is_multi_project_root(self.project).then(|| root.name.clone());
        graph.register(self.project, root, move |task| {
            for name in deps {
                task.depends_on(name);
            }
            if let Some(name) = delegate {
                task.depends_on_children(name);
            }
        })?;
        Ok(())
    }
}
