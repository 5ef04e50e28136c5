//! Gradle Plugin Portal tasks
//!
//! Only one plugin per project goes to the portal: the first plugin
//! publication.

use crate::domain::naming::{self, Destination, Subject, PUBLISH_PLUGINS_TASK};
use crate::domain::{Publication, RepoKind};

use super::registry::{TaskError, TaskGraph};

pub struct PortalTaskBuilder<'a> {
    project: &'a str,
    pubs: &'a [Publication],
}

impl<'a> PortalTaskBuilder<'a> {
    pub fn new(project: &'a str, pubs: &'a [Publication]) -> Self {
        Self { project, pubs }
    }

    pub fn register(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let aggregate = naming::jb_publish(Subject::All, Some(Destination::GradlePortal));

        if graph.is_multi_project_root(self.project) {
            if graph.any_child_has(self.project, &aggregate.name) {
                graph.register_delegate(self.project, aggregate)?;
            }
            return Ok(());
        }

        let Some(publication) = self
            .pubs
            .iter()
            .find(|p| p.is_gradle_plugin() && p.needs(RepoKind::GradlePortal))
        else {
            return Ok(());
        };

        let id = publication.identity();
        let pub_task = naming::jb_publish(Subject::Pub(&id), Some(Destination::GradlePortal));
        let pub_task_name = pub_task.name.clone();

        graph.register(self.project, pub_task, |task| task.depends_on(PUBLISH_PLUGINS_TASK))?;
        graph.register(self.project, aggregate, move |task| task.depends_on(pub_task_name))?;
        Ok(())
    }
}
