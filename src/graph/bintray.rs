//! Legacy Bintray publishing
//!
//! Bintray does not accept snapshots. Release publications go through
//! `bintrayUpload`, snapshot ones through `artifactoryPublish` to OSS JFrog.

use serde::Serialize;
use tracing::warn;

use crate::domain::naming::{
    self, Destination, Subject, ARTIFACTORY_PUBLISH_TASK, BINTRAY_UPLOAD_TASK,
};
use crate::domain::{Publication, RepoKind, TaskDescriptor};

use super::artifactory::artifactory_publish_task;
use super::registry::{TaskError, TaskGraph};

fn bintray_upload_task() -> TaskDescriptor {
    naming::native_task(BINTRAY_UPLOAD_TASK, "Publishes artifacts to bintray.com.")
}

/// Split of Bintray-bound publications by destination
#[derive(Debug, Clone, Default, Serialize)]
pub struct BintrayPublishPlan {
    pub bintray_libs: Vec<String>,
    pub bintray_plugins: Vec<String>,
    pub artifactory_libs: Vec<String>,
    pub artifactory_plugins: Vec<String>,
}

impl BintrayPublishPlan {
    pub fn new(pubs: &[Publication]) -> Self {
        let mut plan = Self::default();
        for publication in pubs.iter().filter(|p| p.needs(RepoKind::Bintray)) {
            let (libs, plugins) = if publication.is_snapshot() {
                (&mut plan.artifactory_libs, &mut plan.artifactory_plugins)
            } else {
                (&mut plan.bintray_libs, &mut plan.bintray_plugins)
            };
            libs.push(publication.pub_name_with_variant());
            if publication.is_gradle_plugin() {
                plugins.push(publication.marker_pub_name());
            }
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.bintray_libs.is_empty() && self.artifactory_libs.is_empty()
    }

    /// Native publications uploaded to Bintray
    pub fn bintray_publications(&self) -> Vec<String> {
        self.bintray_libs
            .iter()
            .chain(&self.bintray_plugins)
            .cloned()
            .collect()
    }

    /// Native publications deployed to OSS JFrog
    pub fn artifactory_publications(&self) -> Vec<String> {
        self.artifactory_libs
            .iter()
            .chain(&self.artifactory_plugins)
            .cloned()
            .collect()
    }

    /// Registers the native upload tasks the plan needs
    pub fn register_tasks(&self, graph: &mut TaskGraph, project: &str) -> Result<(), TaskError> {
        if !self.bintray_libs.is_empty() {
            graph.register_native(project, bintray_upload_task(), None)?;
        }
        if !self.artifactory_libs.is_empty() {
            graph.register_native(project, artifactory_publish_task(), None)?;
        }
        Ok(())
    }
}

pub struct BintrayTaskBuilder<'a> {
    project: &'a str,
    plan: BintrayPublishPlan,
}

impl<'a> BintrayTaskBuilder<'a> {
    pub fn new(project: &'a str, pubs: &[Publication]) -> Self {
        Self {
            project,
            plan: BintrayPublishPlan::new(pubs),
        }
    }

    pub fn plan(&self) -> &BintrayPublishPlan {
        &self.plan
    }

    pub fn register(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let aggregate = naming::jb_publish(Subject::All, Some(Destination::Bintray));

        if graph.is_multi_project_root(self.project) {
            if graph.any_child_has(self.project, &aggregate.name) {
                graph.register_delegate(self.project, aggregate)?;
            }
            return Ok(());
        }

        if !self.plan.artifactory_plugins.is_empty() {
            warn!(
                project = %self.project,
                "Publish snapshot Gradle Plugin to Bintray/OSSArtifactory is not supported."
            );
        }

        if self.plan.is_empty() {
            return Ok(());
        }

        let to_artifactory = !self.plan.artifactory_libs.is_empty();
        let to_bintray = !self.plan.bintray_libs.is_empty();
        graph.register(self.project, aggregate, move |task| {
            if to_artifactory {
                task.depends_on(ARTIFACTORY_PUBLISH_TASK);
            }
            if to_bintray {
                task.depends_on(BINTRAY_UPLOAD_TASK);
            }
        })?;
        Ok(())
    }
}
