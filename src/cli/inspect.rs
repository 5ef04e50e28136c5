//! Model commands (repos, signing, check)

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

use super::output::Output;
use crate::domain::RepoKind;
use crate::graph::{PubSigning, SigningDecision, SkipReason};
use crate::storage::{ProjectModel, Workspace};

fn selected<'w>(workspace: &'w Workspace, project: Option<&str>) -> Result<Vec<&'w ProjectModel>> {
    match project {
        Some(path) => match workspace.project(path) {
            Some(model) => Ok(vec![model]),
            None => bail!("Project not found: {}", path),
        },
        None => Ok(workspace.projects().iter().collect()),
    }
}

#[derive(Serialize)]
struct RepoRow {
    kind: RepoKind,
    id: String,
    description: String,
    /// URL the publication would be deployed to, when the repo has one
    url: Option<String>,
}

#[derive(Serialize)]
struct PubRepos {
    publication: String,
    coordinate: String,
    snapshot: bool,
    repos: Vec<RepoRow>,
}

#[derive(Serialize)]
struct ProjectRepos {
    project: String,
    repos: Vec<String>,
    publications: Vec<PubRepos>,
}

/// Show the repositories each publication targets
pub fn repos(output: &Output, workspace: &Workspace, project: Option<&str>) -> Result<()> {
    let mut report = Vec::new();

    for model in selected(workspace, project)? {
        let publications = model
            .publications
            .iter()
            .map(|publication| {
                let snapshot = publication.is_snapshot();
                let repos = publication
                    .repos()
                    .iter()
                    .map(|repo| RepoRow {
                        kind: repo.kind(),
                        id: repo.id().to_string(),
                        description: repo.description().to_string(),
                        url: repo
                            .endpoint()
                            .and_then(|e| e.effective_url(snapshot).ok())
                            .map(str::to_string),
                    })
                    .collect();
                PubRepos {
                    publication: publication.pub_name_with_variant(),
                    coordinate: publication.gav(),
                    snapshot,
                    repos,
                }
            })
            .collect();

        report.push(ProjectRepos {
            project: model.path.clone(),
            repos: model.repos.iter().map(|r| r.id().to_string()).collect(),
            publications,
        });
    }

    output.report(&report, |report| print_repos(output, report))
}

fn print_repos(output: &Output, report: &[ProjectRepos]) {
    for (i, project) in report.iter().enumerate() {
        if i > 0 {
            output.blank();
        }
        println!("Project {}", project.project);
        println!("  Repositories: {}", project.repos.join(", "));
        if project.publications.is_empty() {
            println!("  No publications.");
        }
        for publication in &project.publications {
            println!("  {} ({})", publication.publication, publication.coordinate);
            for repo in &publication.repos {
                match &repo.url {
                    Some(url) => println!("    {:<24} {}", repo.id, url),
                    None => println!("    {}", repo.id),
                }
            }
        }
    }
}

fn describe(decision: &SigningDecision) -> String {
    match decision {
        SigningDecision::Sign(with) => format!("sign with {:?}", with).to_lowercase(),
        SigningDecision::Skip(SkipReason::Disabled) => "skip: signing disabled".to_string(),
        SigningDecision::Skip(SkipReason::Snapshot) => "skip: snapshot".to_string(),
        SigningDecision::Skip(SkipReason::NotConfigured) => "skip: not configured".to_string(),
    }
}

#[derive(Serialize)]
struct ProjectSigning<'w> {
    project: &'w str,
    required: bool,
    gpg_command: bool,
    publications: &'w [PubSigning],
}

/// Show the signing decision of each publication
pub fn signing(output: &Output, workspace: &Workspace, project: Option<&str>) -> Result<()> {
    let report: Vec<ProjectSigning<'_>> = selected(workspace, project)?
        .into_iter()
        .map(|model| ProjectSigning {
            project: &model.path,
            required: model.signing.is_required(),
            gpg_command: model.signing.uses_gpg_command(),
            publications: model.signing.entries(),
        })
        .collect();

    output.report(&report, |report| {
        println!("{:<12} {:<30} {:<10} DECISION", "PROJECT", "PUBLICATION", "REQUIRED");
        println!("{}", "-".repeat(80));
        for project in report {
            for entry in project.publications {
                println!(
                    "{:<12} {:<30} {:<10} {}",
                    project.project,
                    entry.native_publications.join(", "),
                    if entry.required { "yes" } else { "no" },
                    describe(&entry.decision)
                );
            }
        }
    })
}

#[derive(Serialize)]
struct CheckSummary {
    projects: usize,
    publications: usize,
    tasks: usize,
    skipped: usize,
}

/// Validate the workspace configuration and task graph
///
/// Configuration errors already surfaced while loading. This realizes every
/// task and plans all of them, which catches dangling dependencies and cycles.
pub fn check(output: &Output, workspace: &mut Workspace) -> Result<()> {
    let publications = workspace.projects().iter().map(|p| p.publications.len()).sum();
    let projects = workspace.projects().len();

    let graph = workspace.graph_mut();
    graph.realize_all();

    let paths: Vec<String> = graph
        .project_paths()
        .filter_map(|p| graph.container(p))
        .flat_map(|c| c.iter().map(|t| t.path().to_string()))
        .collect();
    debug!(tasks = paths.len(), "planning every task");

    let plan = graph.execution_plan(&paths)?;
    let summary = CheckSummary {
        projects,
        publications,
        tasks: plan.len(),
        skipped: plan.iter().filter(|t| t.skipped).count(),
    };

    output.report(&summary, |summary| {
        println!(
            "Configuration OK: {} projects, {} publications, {} tasks ({} skipped)",
            summary.projects, summary.publications, summary.tasks, summary.skipped
        )
    })
}
