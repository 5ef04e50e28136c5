//! Maven Local and custom Maven repository tasks
//!
//! ```text
//! jbPublishToMavenLocal
//!   jbPublish<Pub>ToMavenLocal
//!     publish<Pub>PublicationToMavenLocal
//!     publish<Pub>PluginMarkerMavenPublicationToMavenLocal
//!
//! jbPublishToMavenRepositories
//!   jbPublishTo<Repo>
//!     jbPublish<Pub>To<Repo>
//!       publish<Pub>PublicationTo<Repo>Repository
//! jbPublish<Pub>ToMavenRepositories
//!   jbPublish<Pub>To<Repo>
//! ```

use tracing::debug;

use crate::domain::naming::{self, Destination, NativeDest, Subject};
use crate::domain::{any_needs, Publication, RepoKind, RepoSpec};

use super::filter::is_wanted_combination;
use super::registry::{TaskError, TaskGraph};

pub struct MavenTaskBuilder<'a> {
    project: &'a str,
    pubs: &'a [Publication],
}

/// Leaf task names per repo, in first-seen order
#[derive(Default)]
struct RepoTasks {
    entries: Vec<(RepoSpec, Vec<String>)>,
}

impl RepoTasks {
    fn add(&mut self, repo: &RepoSpec, task: String) {
        match self.entries.iter_mut().find(|(r, _)| r == repo) {
            Some((_, tasks)) => tasks.push(task),
            None => self.entries.push((repo.clone(), vec![task])),
        }
    }
}

impl<'a> MavenTaskBuilder<'a> {
    pub fn new(project: &'a str, pubs: &'a [Publication]) -> Self {
        Self { project, pubs }
    }

    /// Registers the Maven Local branch
    pub fn register_maven_local(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let umbrella = naming::jb_publish(Subject::All, Some(Destination::MavenLocal));

        if graph.is_multi_project_root(self.project) {
            graph.register_delegate(self.project, umbrella)?;
            return Ok(());
        }

        let mut pub_tasks = Vec::new();
        for publication in self.pubs.iter().filter(|p| p.needs(RepoKind::MavenLocal)) {
            let id = publication.identity();
            let descriptor = naming::jb_publish(Subject::Pub(&id), Some(Destination::MavenLocal));
            pub_tasks.push(descriptor.name.clone());

            let native = naming::publish(Subject::Pub(&id), Some(NativeDest::MavenLocal)).name;
            let marker = publication
                .is_gradle_plugin()
                .then(|| naming::publish(Subject::Marker(&id), Some(NativeDest::MavenLocal)).name);

            graph.register(self.project, descriptor, move |task| {
                task.depends_on(native);
                if let Some(marker) = marker {
                    task.depends_on(marker);
                }
            })?;
        }

        if !pub_tasks.is_empty() {
            graph.register(self.project, umbrella, move |task| {
                for name in pub_tasks {
                    task.depends_on(name);
                }
            })?;
        }
        Ok(())
    }

    /// Registers the custom Maven repository branch and gates native tasks
    pub fn register_maven_repositories(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        let all_repos = naming::jb_publish(Subject::All, Some(Destination::MavenRepositories));

        if graph.is_multi_project_root(self.project) {
            if graph.any_child_has(self.project, &all_repos.name) {
                graph.register_delegate(self.project, all_repos)?;
            }
            return Ok(());
        }

        if !any_needs(self.pubs, Publication::needs_maven) {
            return Ok(());
        }

        let mut repo_tasks = RepoTasks::default();

        for publication in self.pubs {
            let repos = publication.repos();
            let id = publication.identity();
            let mut leaves = Vec::new();

            for spec in repos.maven_repos() {
                let descriptor = naming::jb_publish(Subject::Pub(&id), Some(Destination::of(spec)));
                let native = naming::publish(Subject::Pub(&id), Some(NativeDest::Repo(spec))).name;
                let marker = publication
                    .is_gradle_plugin()
                    .then(|| naming::publish(Subject::Marker(&id), Some(NativeDest::Repo(spec))).name);

                leaves.push(descriptor.name.clone());
                repo_tasks.add(spec, descriptor.name.clone());

                graph.register(self.project, descriptor, move |task| {
                    task.depends_on(native);
                    if let Some(marker) = marker {
                        task.depends_on(marker);
                    }
                })?;
            }

            if leaves.is_empty() {
                continue;
            }
            let descriptor = naming::jb_publish(Subject::Pub(&id), Some(Destination::MavenRepositories));
            graph.register(self.project, descriptor, move |task| {
                for name in leaves {
                    task.depends_on(name);
                }
            })?;
        }

        let mut aggregates = Vec::with_capacity(repo_tasks.entries.len());
        for (repo, leaves) in repo_tasks.entries {
            let descriptor = naming::jb_publish(Subject::All, Some(Destination::Repo(&repo)));
            aggregates.push(descriptor.name.clone());
            graph.register(self.project, descriptor, move |task| {
                for name in leaves {
                    task.depends_on(name);
                }
            })?;
        }

        graph.register(self.project, all_repos, move |task| {
            for name in aggregates {
                task.depends_on(name);
            }
        })?;

        let pubs = self.pubs.to_vec();
        let disabled = graph.gate_publications(self.project, move |binding| {
            is_wanted_combination(&pubs, &binding.repository, &binding.publication)
        })?;
        debug!(project = %self.project, disabled, "filtered unwanted publication/repository pairs");
        Ok(())
    }
}
