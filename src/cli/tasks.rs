//! Task commands (tasks, graph, plan)

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

use super::output::Output;
use crate::domain::naming::{capitalize, JB_GROUP};
use crate::graph::{task_path, ROOT_PROJECT};
use crate::storage::Workspace;

/// Turns a bare task name into a path in `project` (root by default)
pub fn resolve_task(name: &str, project: Option<&str>) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        task_path(project.unwrap_or(ROOT_PROJECT), name)
    }
}

fn selected_projects<'w>(workspace: &'w Workspace, project: Option<&str>) -> Result<Vec<&'w str>> {
    let paths: Vec<&str> = workspace.graph().project_paths().collect();
    match project {
        Some(p) if !paths.contains(&p) => bail!("Project not found: {}", p),
        Some(p) => Ok(paths.into_iter().filter(|path| *path == p).collect()),
        None => Ok(paths),
    }
}

#[derive(Serialize)]
struct TaskRow<'a> {
    path: &'a str,
    group: &'a str,
    description: &'a str,
    enabled: bool,
}

/// List the registered tasks
pub fn list(output: &Output, workspace: &Workspace, project: Option<&str>, all: bool) -> Result<()> {
    let graph = workspace.graph();
    let mut rows = Vec::new();

    for path in selected_projects(workspace, project)? {
        let Some(container) = graph.container(path) else {
            continue;
        };
        for task in container.iter() {
            let descriptor = task.descriptor();
            if !all && descriptor.group != JB_GROUP {
                continue;
            }
            rows.push(TaskRow {
                path: task.path(),
                group: &descriptor.group,
                description: &descriptor.description,
                enabled: task.is_enabled(),
            });
        }
    }
    debug!(count = rows.len(), "listing tasks");

    output.report(&rows, |rows| print_groups(output, rows))
}

fn print_groups(output: &Output, rows: &[TaskRow<'_>]) {
    if rows.is_empty() {
        println!("No tasks.");
        return;
    }

    let mut groups: Vec<&str> = Vec::new();
    for row in rows {
        if !groups.contains(&row.group) {
            groups.push(row.group);
        }
    }
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            output.blank();
        }
        let title = format!("{} tasks", capitalize(group));
        println!("{}", title);
        println!("{}", "-".repeat(title.len()));
        for row in rows.iter().filter(|r| r.group == *group) {
            let gated = if row.enabled { "" } else { " (skipped)" };
            println!("{} - {}{}", row.path, row.description, gated);
        }
    }
}

/// Show the dependency tree of a task
pub fn graph(
    output: &Output,
    workspace: &mut Workspace,
    task: &str,
    project: Option<&str>,
) -> Result<()> {
    let path = resolve_task(task, project);
    debug!(%path, "building task tree");

    let tree = workspace.graph_mut().tree(&path)?;
    output.report(&tree, |tree| print!("{}", tree))
}

/// Show the execution order of tasks
pub fn plan(
    output: &Output,
    workspace: &mut Workspace,
    tasks: &[String],
    project: Option<&str>,
) -> Result<()> {
    let roots: Vec<String> = tasks.iter().map(|t| resolve_task(t, project)).collect();
    debug!(roots = %roots.join(", "), "planning");

    let plan = workspace.graph_mut().execution_plan(&roots)?;
    output.report(&plan, |plan| {
        let skipped = plan.iter().filter(|t| t.skipped).count();
        println!("Execution plan ({} tasks, {} skipped):", plan.len(), skipped);
        for (i, task) in plan.iter().enumerate() {
            let marker = if task.skipped { " SKIPPED" } else { "" };
            println!("{:>3}. {}{}", i + 1, task.path, marker);
        }
    })
}
