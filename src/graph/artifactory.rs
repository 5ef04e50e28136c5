//! Artifactory publishing
//!
//! A project publishes to at most one Artifactory-shaped server through the
//! native `artifactoryPublish` task.

use serde::Serialize;
use tracing::debug;

use crate::domain::naming::{self, Destination, Subject, ARTIFACTORY_PUBLISH_TASK};
use crate::domain::{any_needs, Publication, RepoSpec, TaskDescriptor};

use super::registry::{TaskError, TaskGraph};
use super::BuildError;

/// Descriptor of the native task of the Artifactory plugin
pub fn artifactory_publish_task() -> TaskDescriptor {
    naming::native_task(
        ARTIFACTORY_PUBLISH_TASK,
        "Deploys the generated publications to Artifactory",
    )
}

/// Artifactory settings of one project
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactoryModel {
    pub repo: RepoSpec,
    pub context_url: String,
    pub repo_key: String,
    /// Native publications deployed, markers included
    pub publications: Vec<String>,
}

impl ArtifactoryModel {
    /// Returns `None` when no publication targets Artifactory
    pub fn from_publications(pubs: &[Publication]) -> Result<Option<Self>, BuildError> {
        let targeting: Vec<&Publication> = pubs.iter().filter(|p| p.needs_artifactory()).collect();
        let Some(first) = targeting.first() else {
            return Ok(None);
        };

        let releases = targeting.iter().filter(|p| !p.is_snapshot()).count();
        if releases != 0 && releases != targeting.len() {
            return Err(BuildError::MixedArtifactoryVersions);
        }

        let mut specs: Vec<RepoSpec> = Vec::new();
        for publication in &targeting {
            for spec in publication.repos().iter().filter(|r| r.is_artifactory()) {
                if !specs.contains(spec) {
                    specs.push(spec.clone());
                }
            }
        }
        if specs.len() > 1 {
            return Err(BuildError::MultipleArtifactoryRepos);
        }
        let Some(repo) = specs.pop() else {
            return Ok(None);
        };

        let (repo_key, context_url) = match &repo {
            RepoSpec::Artifactory {
                repo_key, endpoint, ..
            }
            | RepoSpec::BintraySnapshot { repo_key, endpoint } => (
                repo_key.clone(),
                endpoint.effective_url(first.is_snapshot())?.to_string(),
            ),
            _ => return Ok(None),
        };

        let mut publications = Vec::new();
        for publication in &targeting {
            publications.push(publication.pub_name_with_variant());
            if publication.is_gradle_plugin() {
                publications.push(publication.marker_pub_name());
            }
        }

        debug!(repo = %repo, %context_url, "configured Artifactory");
        Ok(Some(Self {
            repo,
            context_url,
            repo_key,
            publications,
        }))
    }

    pub fn register_tasks(&self, graph: &mut TaskGraph, project: &str) -> Result<(), TaskError> {
        graph.register_native(project, artifactory_publish_task(), None)?;
        Ok(())
    }
}

pub struct ArtifactoryTaskBuilder<'a> {
    project: &'a str,
    pubs: &'a [Publication],
}

impl<'a> ArtifactoryTaskBuilder<'a> {
    pub fn new(project: &'a str, pubs: &'a [Publication]) -> Self {
        Self { project, pubs }
    }

    pub fn register(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let aggregate = naming::jb_publish(Subject::All, Some(Destination::Artifactory));

        if graph.is_multi_project_root(self.project) {
            if graph.any_child_has(self.project, &aggregate.name) {
                graph.register_delegate(self.project, aggregate)?;
            }
            return Ok(());
        }

        if any_needs(self.pubs, Publication::needs_artifactory) {
            graph.register(self.project, aggregate, |task| {
                task.depends_on(ARTIFACTORY_PUBLISH_TASK)
            })?;
        }
        Ok(())
    }
}
