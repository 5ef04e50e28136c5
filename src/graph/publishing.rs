//! Native publishing model
//!
//! What the native `maven-publish` plugin would hold after configuration:
//! one Maven publication per [`Publication`] (plus a marker publication for
//! Gradle plugins) and the union of non-local Maven repositories. The native
//! plugin creates publish tasks for the full publication × repository cross
//! product; unwanted pairs are gated off later by the Maven builder.

use serde::Serialize;
use tracing::debug;

use crate::domain::naming::{self, NativeDest, Subject};
use crate::domain::{PubIdentity, Publication, RepoError, RepoSpec, SourceSelector};

use super::registry::{PublishBinding, TaskError, TaskGraph};

#[derive(Debug, Clone, Serialize)]
pub struct NativePublication {
    pub name: String,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Artifact sources, as component or jar task names
    pub artifacts: Vec<String>,
    /// Publication this marker points at, for plugin markers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_of: Option<String>,
    #[serde(skip)]
    identity: PubIdentity,
    /// Tasks producing the jar artifacts
    #[serde(skip)]
    jar_tasks: Vec<String>,
}

impl NativePublication {
    fn subject(&self) -> Subject<'_> {
        if self.marker_of.is_some() {
            Subject::Marker(&self.identity)
        } else {
            Subject::Pub(&self.identity)
        }
    }

    pub fn coordinate(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NativeRepository {
    pub name: String,
    pub url: String,
    pub username: String,
    pub allow_insecure_protocol: bool,
    #[serde(skip)]
    spec: RepoSpec,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishingModel {
    publications: Vec<NativePublication>,
    repositories: Vec<NativeRepository>,
}

fn depend_on_jars(
    graph: &mut TaskGraph,
    path: &str,
    publication: &NativePublication,
) -> Result<(), TaskError> {
    if publication.jar_tasks.is_empty() {
        return Ok(());
    }
    let jars = publication.jar_tasks.clone();
    graph.configure(path, move |task| {
        for jar in jars {
            task.depends_on(jar);
        }
    })
}

fn source_artifact(source: &SourceSelector) -> String {
    match source {
        SourceSelector::Component(name) => format!("component:{name}"),
        SourceSelector::SourceSet(name) => format!("jar:{name}"),
    }
}

impl PublishingModel {
    /// Builds the model of one project from its finalized publications
    ///
    /// Repository URLs follow the first publication targeting the repository,
    /// so a snapshot publication needs a snapshot URL.
    pub fn from_publications(pubs: &[Publication]) -> Result<Self, RepoError> {
        let mut model = PublishingModel::default();

        for publication in pubs {
            let identity = publication.identity();
            let name = identity.name_with_variant();
            let jar_tasks = vec![
                naming::sources_jar(&identity).name,
                naming::dokka_jar(&identity).name,
            ];

            model.publications.push(NativePublication {
                name: name.clone(),
                group_id: publication.pom.group().to_string(),
                artifact_id: publication.variant_artifact_id(),
                version: publication.variant_version(),
                artifacts: std::iter::once(source_artifact(&publication.source))
                    .chain(jar_tasks.iter().cloned())
                    .collect(),
                marker_of: None,
                identity: identity.clone(),
                jar_tasks,
            });

            if let Some(plugin_id) = publication.pom.plugin_id() {
                model.publications.push(NativePublication {
                    name: identity.marker_name(),
                    group_id: plugin_id.to_string(),
                    artifact_id: format!("{plugin_id}.gradle.plugin"),
                    version: publication.variant_version(),
                    artifacts: Vec::new(),
                    marker_of: Some(name),
                    identity,
                    jar_tasks: Vec::new(),
                });
            }

            let repos = publication.repos();
            for spec in repos.maven_repos() {
                if model.repositories.iter().any(|r| &r.spec == spec) {
                    continue;
                }
                let Some(endpoint) = spec.endpoint() else {
                    continue;
                };
                let url = endpoint.effective_url(publication.is_snapshot())?;
                model.repositories.push(NativeRepository {
                    name: spec.repo_name(),
                    url: url.to_string(),
                    username: endpoint.username.clone(),
                    allow_insecure_protocol: endpoint.allow_insecure_protocol,
                    spec: spec.clone(),
                });
            }
        }

        debug!(
            publications = model.publications.len(),
            repositories = model.repositories.len(),
            "built native publishing model"
        );
        Ok(model)
    }

    pub fn publications(&self) -> &[NativePublication] {
        &self.publications
    }

    pub fn repositories(&self) -> &[NativeRepository] {
        &self.repositories
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }

    /// Registers the tasks the native plugin creates in `project`
    ///
    /// Publish tasks depend on the sources and doc jars of their
    /// publication, which [`super::DocsBuilder`] registers.
    pub fn register_tasks(&self, graph: &mut TaskGraph, project: &str) -> Result<(), TaskError> {
        if self.is_empty() {
            return Ok(());
        }

        let mut local_tasks = Vec::with_capacity(self.publications.len());
        for publication in &self.publications {
            let descriptor = naming::publish(publication.subject(), Some(NativeDest::MavenLocal));
            local_tasks.push(descriptor.name.clone());
            let path = graph.register_native(project, descriptor, None)?;
            depend_on_jars(graph, &path, publication)?;
        }

        let mut repo_aggregates = Vec::with_capacity(self.repositories.len());
        for repository in &self.repositories {
            let dest = NativeDest::Repo(&repository.spec);
            let mut repo_tasks = Vec::with_capacity(self.publications.len());

            for publication in &self.publications {
                let descriptor = naming::publish(publication.subject(), Some(dest));
                repo_tasks.push(descriptor.name.clone());
                let binding = PublishBinding {
                    repository: repository.name.clone(),
                    publication: publication.name.clone(),
                };
                let path = graph.register_native(project, descriptor, Some(binding))?;
                depend_on_jars(graph, &path, publication)?;
            }

            let aggregate = naming::publish(Subject::All, Some(dest));
            repo_aggregates.push(aggregate.name.clone());
            graph.register(project, aggregate, move |task| {
                for name in repo_tasks {
                    task.depends_on(name);
                }
            })?;
        }

        graph.register(
            project,
            naming::publish(Subject::All, Some(NativeDest::MavenLocal)),
            move |task| {
                for name in local_tasks {
                    task.depends_on(name);
                }
            },
        )?;
        graph.register(project, naming::publish(Subject::All, None), move |task| {
            for name in repo_aggregates {
                task.depends_on(name);
            }
        })?;

        Ok(())
    }
}
