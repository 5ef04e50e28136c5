//! Task containers and the task dependency graph
//!
//! Every project owns a [`TaskContainer`]. Tasks are registered with a
//! configure callback that only runs when the task is realized, unless the
//! graph is in [`RegistrationMode::Eager`]. Registering an existing name
//! returns the existing task, so builders may run repeatedly.
//!
//! Execution plans are computed with petgraph over the realized
//! dependencies of the requested tasks.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::TaskDescriptor;

pub const ROOT_PROJECT: &str = ":";

#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Task '{name}' is already registered in project '{project}' with a different description")]
    Conflict { project: String, name: String },

    #[error("Project not found: {0}")]
    UnknownProject(String),

    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Project already exists: {0}")]
    DuplicateProject(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Task dependencies form a cycle at: {0}")]
    Cycle(String),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// When configure callbacks run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMode {
    /// On first realization of the task
    #[default]
    Lazy,
    /// Right after registration, so wiring is observable at once
    Eager,
}

/// Full path of a task, e.g. `:jbPublish` or `:app:jbPublish`
pub fn task_path(project: &str, name: &str) -> String {
    if project == ROOT_PROJECT {
        format!(":{name}")
    } else {
        format!("{project}:{name}")
    }
}

/// Splits a task path into project path and task name
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    let idx = path.rfind(':')?;
    let (project, name) = (&path[..idx], &path[idx + 1..]);
    if name.is_empty() {
        return None;
    }
    Some((if project.is_empty() { ROOT_PROJECT } else { project }, name))
}

fn parent_path(project: &str) -> Option<String> {
    if project == ROOT_PROJECT {
        return None;
    }
    match project.rfind(':') {
        Some(0) | None => Some(ROOT_PROJECT.to_string()),
        Some(idx) => Some(project[..idx].to_string()),
    }
}

/// Native `PublishToMavenRepository` binding of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishBinding {
    pub repository: String,
    pub publication: String,
}

enum DepRef {
    Local(String),
    Path(String),
    Children(String),
}

/// Collects the dependencies a configure callback declares
#[derive(Default)]
pub struct TaskConfig {
    refs: Vec<DepRef>,
}

impl TaskConfig {
    /// Depends on a task of the same project
    pub fn depends_on(&mut self, name: impl Into<String>) {
        self.refs.push(DepRef::Local(name.into()));
    }

    /// Depends on a task by full path
    pub fn depends_on_path(&mut self, path: impl Into<String>) {
        self.refs.push(DepRef::Path(path.into()));
    }

    /// Depends on the task of that name in every child project having one
    pub fn depends_on_children(&mut self, name: impl Into<String>) {
        self.refs.push(DepRef::Children(name.into()));
    }
}

type Configure = Box<dyn FnOnce(&mut TaskConfig)>;
type Gate = Box<dyn Fn(&PublishBinding) -> bool>;

pub struct Task {
    descriptor: TaskDescriptor,
    path: String,
    pending: Vec<Configure>,
    realized: bool,
    dependencies: Vec<String>,
    binding: Option<PublishBinding>,
    only_if: Option<bool>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("path", &self.path)
            .field("descriptor", &self.descriptor)
            .field("pending", &self.pending.len())
            .field("realized", &self.realized)
            .field("dependencies", &self.dependencies)
            .field("binding", &self.binding)
            .field("only_if", &self.only_if)
            .finish()
    }
}

impl Task {
    pub fn descriptor(&self) -> &TaskDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_realized(&self) -> bool {
        self.realized
    }

    /// Resolved dependency paths; empty until realized
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn binding(&self) -> Option<&PublishBinding> {
        self.binding.as_ref()
    }

    /// False if an only-if gate rejected the task
    pub fn is_enabled(&self) -> bool {
        self.only_if.unwrap_or(true)
    }
}

/// Tasks of one project, in registration order
#[derive(Debug, Default)]
pub struct TaskContainer {
    tasks: Vec<Task>,
    by_name: HashMap<String, usize>,
}

impl TaskContainer {
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.by_name.get(name).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

struct ProjectNode {
    path: String,
    children: Vec<usize>,
    container: TaskContainer,
    /// Only-if predicate of native repository publish tasks
    gate: Option<Gate>,
}

impl fmt::Debug for ProjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectNode")
            .field("path", &self.path)
            .field("children", &self.children)
            .field("container", &self.container)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

/// A task of an execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTask {
    pub path: String,
    pub group: String,
    pub description: String,
    pub skipped: bool,
}

/// Dependency tree below one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTree {
    pub path: String,
    /// Task name, or the full path when in another project than the parent
    pub label: String,
    pub skipped: bool,
    pub missing: bool,
    pub children: Vec<TaskTree>,
}

impl TaskTree {
    /// One-line form, e.g. `jbPublish{jbPublishToMavenLocal{...}}`
    pub fn compact(&self) -> String {
        if self.children.is_empty() {
            self.label.clone()
        } else {
            let children: Vec<String> = self.children.iter().map(TaskTree::compact).collect();
            format!("{}{{{}}}", self.label, children.join(","))
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let mut line = format!("{}{}", "  ".repeat(depth), self.label);
        if self.skipped {
            line.push_str(" (skipped)");
        }
        if self.missing {
            line.push_str(" (missing)");
        }
        writeln!(f, "{}", line)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TaskTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Task containers of all projects of a build
#[derive(Debug)]
pub struct TaskGraph {
    mode: RegistrationMode,
    projects: Vec<ProjectNode>,
    by_path: HashMap<String, usize>,
}

impl TaskGraph {
    /// Creates a graph holding only the root project
    pub fn new(mode: RegistrationMode) -> Self {
        let root = ProjectNode {
            path: ROOT_PROJECT.to_string(),
            children: Vec::new(),
            container: TaskContainer::default(),
            gate: None,
        };
        Self {
            mode,
            projects: vec![root],
            by_path: HashMap::from([(ROOT_PROJECT.to_string(), 0)]),
        }
    }

    pub fn mode(&self) -> RegistrationMode {
        self.mode
    }

    /// Adds a project; its parent is derived from the path and must exist
    pub fn add_project(&mut self, path: &str) -> Result<(), TaskError> {
        if self.by_path.contains_key(path) {
            return Err(TaskError::DuplicateProject(path.to_string()));
        }
        let parent = parent_path(path).ok_or_else(|| TaskError::DuplicateProject(path.to_string()))?;
        let parent_idx = *self
            .by_path
            .get(&parent)
            .ok_or(TaskError::UnknownProject(parent))?;

        let idx = self.projects.len();
        self.projects.push(ProjectNode {
            path: path.to_string(),
            children: Vec::new(),
            container: TaskContainer::default(),
            gate: None,
        });
        self.projects[parent_idx].children.push(idx);
        self.by_path.insert(path.to_string(), idx);
        Ok(())
    }

    pub fn project_paths(&self) -> impl Iterator<Item = &str> {
        self.projects.iter().map(|p| p.path.as_str())
    }

    fn project_index(&self, project: &str) -> Result<usize, TaskError> {
        self.by_path
            .get(project)
            .copied()
            .ok_or_else(|| TaskError::UnknownProject(project.to_string()))
    }

    pub fn children_of(&self, project: &str) -> Result<Vec<&str>, TaskError> {
        let idx = self.project_index(project)?;
        Ok(self.projects[idx]
            .children
            .iter()
            .map(|&c| self.projects[c].path.as_str())
            .collect())
    }

    /// Root project with at least one child
    pub fn is_multi_project_root(&self, project: &str) -> bool {
        project == ROOT_PROJECT && !self.projects[0].children.is_empty()
    }

    pub fn container(&self, project: &str) -> Option<&TaskContainer> {
        self.by_path.get(project).map(|&i| &self.projects[i].container)
    }

    pub fn has_task(&self, project: &str, name: &str) -> bool {
        self.container(project).is_some_and(|c| c.contains(name))
    }

    /// Task by full path, without realizing it
    pub fn task(&self, path: &str) -> Option<&Task> {
        let (pi, ti) = self.locate(path).ok()?;
        Some(&self.projects[pi].container.tasks[ti])
    }

    fn locate(&self, path: &str) -> Result<(usize, usize), TaskError> {
        let unknown = || TaskError::UnknownTask(path.to_string());
        let (project, name) = split_path(path).ok_or_else(unknown)?;
        let pi = *self.by_path.get(project).ok_or_else(unknown)?;
        let ti = *self.projects[pi]
            .container
            .by_name
            .get(name)
            .ok_or_else(unknown)?;
        Ok((pi, ti))
    }

    /// Registers a task, or returns the existing task of the same name
    ///
    /// The callback is queued on the task either way. Returns the task path.
    pub fn register<F>(
        &mut self,
        project: &str,
        descriptor: TaskDescriptor,
        configure: F,
    ) -> Result<String, TaskError>
    where
        F: FnOnce(&mut TaskConfig) + 'static,
    {
        self.register_with(project, descriptor, None, Some(Box::new(configure)))
    }

    /// Registers a task depending on the task of the same name in every
    /// child project that has one
    pub fn register_delegate(
        &mut self,
        project: &str,
        descriptor: TaskDescriptor,
    ) -> Result<String, TaskError> {
        let name = descriptor.name.clone();
        self.register(project, descriptor, move |task| task.depends_on_children(name))
    }

    /// True if some child of `project` has a task named `name`
    pub fn any_child_has(&self, project: &str, name: &str) -> bool {
        self.by_path.get(project).is_some_and(|&pi| {
            self.projects[pi]
                .children
                .iter()
                .any(|&c| self.projects[c].container.contains(name))
        })
    }

    /// Registers a task created by a native publishing plugin
    pub fn register_native(
        &mut self,
        project: &str,
        descriptor: TaskDescriptor,
        binding: Option<PublishBinding>,
    ) -> Result<String, TaskError> {
        self.register_with(project, descriptor, binding, None)
    }

    fn register_with(
        &mut self,
        project: &str,
        descriptor: TaskDescriptor,
        binding: Option<PublishBinding>,
        configure: Option<Configure>,
    ) -> Result<String, TaskError> {
        let pi = self.project_index(project)?;
        let ProjectNode { container, gate, .. } = &mut self.projects[pi];

        let ti = match container.by_name.get(&descriptor.name).copied() {
            Some(ti) => {
                let existing = &container.tasks[ti];
                if existing.descriptor != descriptor {
                    return Err(TaskError::Conflict {
                        project: project.to_string(),
                        name: descriptor.name,
                    });
                }
                trace!(path = %existing.path, "task already registered");
                ti
            }
            None => {
                let ti = container.tasks.len();
                let path = task_path(project, &descriptor.name);
                debug!(%path, "registering task");
                let only_if = match (&binding, gate.as_ref()) {
                    (Some(binding), Some(gate)) => Some(gate(binding)),
                    _ => None,
                };
                container.by_name.insert(descriptor.name.clone(), ti);
                container.tasks.push(Task {
                    descriptor,
                    path,
                    pending: Vec::new(),
                    realized: false,
                    dependencies: Vec::new(),
                    binding,
                    only_if,
                });
                ti
            }
        };

        let task = &mut container.tasks[ti];
        if let Some(configure) = configure {
            task.pending.push(configure);
        }
        let path = task.path.clone();
        let needs_run = task.realized && !task.pending.is_empty();

        if self.mode == RegistrationMode::Eager || needs_run {
            self.realize_at(pi, ti);
        }
        Ok(path)
    }

    /// Adds a configure callback to an existing task
    pub fn configure<F>(&mut self, path: &str, configure: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut TaskConfig) + 'static,
    {
        let (pi, ti) = self.locate(path)?;
        let task = &mut self.projects[pi].container.tasks[ti];
        task.pending.push(Box::new(configure));
        if self.mode == RegistrationMode::Eager || task.realized {
            self.realize_at(pi, ti);
        }
        Ok(())
    }

    /// Sets the only-if gate of the native repository publish tasks of a project
    ///
    /// The gate covers tasks registered before and after this call. Returns
    /// the number of already registered tasks it disabled.
    pub fn gate_publications<P>(&mut self, project: &str, predicate: P) -> Result<usize, TaskError>
    where
        P: Fn(&PublishBinding) -> bool + 'static,
    {
        let pi = self.project_index(project)?;
        let ProjectNode { container, gate, .. } = &mut self.projects[pi];
        let predicate = &*gate.insert(Box::new(predicate));
        let mut disabled = 0;
        for task in &mut container.tasks {
            if let Some(binding) = &task.binding {
                let wanted = predicate(binding);
                if !wanted {
                    trace!(path = %task.path, "gated off");
                    disabled += 1;
                }
                task.only_if = Some(wanted);
            }
        }
        Ok(disabled)
    }

    fn realize_at(&mut self, pi: usize, ti: usize) {
        let task = &mut self.projects[pi].container.tasks[ti];
        if task.realized && task.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut task.pending);
        task.realized = true;
        trace!(path = %task.path, callbacks = pending.len(), "realizing task");

        let mut config = TaskConfig::default();
        for configure in pending {
            configure(&mut config);
        }
        let resolved = self.resolve(pi, config.refs);

        let task = &mut self.projects[pi].container.tasks[ti];
        for path in resolved {
            if !task.dependencies.contains(&path) {
                task.dependencies.push(path);
            }
        }
    }

    fn resolve(&self, pi: usize, refs: Vec<DepRef>) -> Vec<String> {
        let project = &self.projects[pi];
        let mut paths = Vec::new();
        for dep in refs {
            match dep {
                DepRef::Local(name) => paths.push(task_path(&project.path, &name)),
                DepRef::Path(path) => paths.push(path),
                DepRef::Children(name) => {
                    for &child in &project.children {
                        let child = &self.projects[child];
                        if child.container.contains(&name) {
                            paths.push(task_path(&child.path, &name));
                        }
                    }
                }
            }
        }
        paths
    }

    /// Realizes a task by path
    pub fn realize(&mut self, path: &str) -> Result<(), TaskError> {
        let (pi, ti) = self.locate(path)?;
        self.realize_at(pi, ti);
        Ok(())
    }

    /// Realizes every registered task
    pub fn realize_all(&mut self) {
        for pi in 0..self.projects.len() {
            for ti in 0..self.projects[pi].container.tasks.len() {
                self.realize_at(pi, ti);
            }
        }
    }

    /// Number of realized tasks across all projects
    pub fn realized_count(&self) -> usize {
        self.projects
            .iter()
            .flat_map(|p| p.container.tasks.iter())
            .filter(|t| t.realized)
            .count()
    }

    /// Realizes a task and returns its dependency paths
    pub fn dependencies(&mut self, path: &str) -> Result<Vec<String>, TaskError> {
        let (pi, ti) = self.locate(path)?;
        self.realize_at(pi, ti);
        Ok(self.projects[pi].container.tasks[ti].dependencies.clone())
    }

    /// Dependency tree of a task, realizing what it reaches
    pub fn tree(&mut self, path: &str) -> Result<TaskTree, PlanError> {
        self.locate(path)?;
        let mut stack = Vec::new();
        self.tree_at(path, None, &mut stack)
    }

    fn tree_at(
        &mut self,
        path: &str,
        parent_project: Option<&str>,
        stack: &mut Vec<String>,
    ) -> Result<TaskTree, PlanError> {
        if stack.iter().any(|p| p == path) {
            return Err(PlanError::Cycle(path.to_string()));
        }
        let (project, name) =
            split_path(path).ok_or_else(|| TaskError::UnknownTask(path.to_string()))?;
        let label = match parent_project {
            Some(parent) if parent != project => path.to_string(),
            _ => name.to_string(),
        };

        let Ok((pi, ti)) = self.locate(path) else {
            return Ok(TaskTree {
                path: path.to_string(),
                label,
                skipped: false,
                missing: true,
                children: Vec::new(),
            });
        };

        self.realize_at(pi, ti);
        let task = &self.projects[pi].container.tasks[ti];
        let deps = task.dependencies.clone();
        let skipped = !task.is_enabled();

        stack.push(path.to_string());
        let mut children = Vec::with_capacity(deps.len());
        for dep in &deps {
            children.push(self.tree_at(dep, Some(project), stack)?);
        }
        stack.pop();

        Ok(TaskTree {
            path: path.to_string(),
            label,
            skipped,
            missing: false,
            children,
        })
    }

    /// Orders the tasks reachable from `roots` so dependencies come first
    pub fn execution_plan(&mut self, roots: &[String]) -> Result<Vec<PlannedTask>, PlanError> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for root in roots {
            if seen.insert(root.clone()) {
                queue.push_back(root.clone());
            }
        }

        while let Some(path) = queue.pop_front() {
            let deps = self.dependencies(&path)?;
            let task_idx = *nodes
                .entry(path.clone())
                .or_insert_with(|| graph.add_node(path.clone()));

            for dep in deps {
                let dep_idx = *nodes
                    .entry(dep.clone())
                    .or_insert_with(|| graph.add_node(dep.clone()));
                // Edge direction: dependency -> dependent
                graph.add_edge(dep_idx, task_idx, ());
                if seen.insert(dep.clone()) {
                    queue.push_back(dep);
                }
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| PlanError::Cycle(graph[cycle.node_id()].clone()))?;

        let mut plan = Vec::with_capacity(order.len());
        for idx in order {
            let path = &graph[idx];
            let task = self
                .task(path)
                .ok_or_else(|| TaskError::UnknownTask(path.clone()))?;
            plan.push(PlannedTask {
                path: path.clone(),
                group: task.descriptor.group.clone(),
                description: task.descriptor.description.clone(),
                skipped: !task.is_enabled(),
            });
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str) -> TaskDescriptor {
        TaskDescriptor::new("test", name, format!("{name} task"))
    }

    fn lazy() -> TaskGraph {
        TaskGraph::new(RegistrationMode::Lazy)
    }

    #[test]
    fn paths_split_and_join() {
        assert_eq!(task_path(ROOT_PROJECT, "jbPublish"), ":jbPublish");
        assert_eq!(task_path(":app", "jbPublish"), ":app:jbPublish");
        assert_eq!(split_path(":jbPublish"), Some((":", "jbPublish")));
        assert_eq!(split_path(":app:lib:jbPublish"), Some((":app:lib", "jbPublish")));
        assert_eq!(split_path("jbPublish"), None);
    }

    #[test]
    fn project_parents_are_derived_from_path() {
        let mut graph = lazy();
        graph.add_project(":app").unwrap();
        graph.add_project(":app:core").unwrap();

        assert_eq!(graph.children_of(":").unwrap(), vec![":app"]);
        assert_eq!(graph.children_of(":app").unwrap(), vec![":app:core"]);
        assert_eq!(
            graph.add_project(":x:y").unwrap_err(),
            TaskError::UnknownProject(":x".to_string())
        );
        assert_eq!(
            graph.add_project(":app").unwrap_err(),
            TaskError::DuplicateProject(":app".to_string())
        );
    }

    #[test]
    fn multi_project_root_needs_children() {
        let mut graph = lazy();
        assert!(!graph.is_multi_project_root(ROOT_PROJECT));
        graph.add_project(":app").unwrap();
        assert!(graph.is_multi_project_root(ROOT_PROJECT));
        assert!(!graph.is_multi_project_root(":app"));
    }

    #[test]
    fn lazy_callbacks_wait_for_realization() {
        let mut graph = lazy();
        graph.register(ROOT_PROJECT, desc("b"), |_| {}).unwrap();
        graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("b"))
            .unwrap();

        assert_eq!(graph.realized_count(), 0);
        assert!(graph.task(":a").unwrap().dependencies().is_empty());

        assert_eq!(graph.dependencies(":a").unwrap(), vec![":b"]);
        assert!(graph.task(":a").unwrap().is_realized());
        assert!(!graph.task(":b").unwrap().is_realized());
    }

    #[test]
    fn eager_mode_realizes_on_registration() {
        let mut graph = TaskGraph::new(RegistrationMode::Eager);
        graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("b"))
            .unwrap();

        assert_eq!(graph.realized_count(), 1);
        assert_eq!(graph.task(":a").unwrap().dependencies(), [":b".to_string()]);
    }

    #[test]
    fn registration_is_idempotent() {
        let mut graph = lazy();
        let first = graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("b"))
            .unwrap();
        let second = graph
            .register(ROOT_PROJECT, desc("a"), |t| {
                t.depends_on("b");
                t.depends_on("c");
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.container(ROOT_PROJECT).unwrap().len(), 1);
        assert_eq!(graph.dependencies(":a").unwrap(), vec![":b", ":c"]);
    }

    #[test]
    fn same_name_different_descriptor_conflicts() {
        let mut graph = lazy();
        graph.register(ROOT_PROJECT, desc("a"), |_| {}).unwrap();

        let other = TaskDescriptor::new("test", "a", "something else");
        assert_eq!(
            graph.register(ROOT_PROJECT, other, |_| {}).unwrap_err(),
            TaskError::Conflict {
                project: ROOT_PROJECT.to_string(),
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn configure_after_realization_runs_at_once() {
        let mut graph = lazy();
        graph.register(ROOT_PROJECT, desc("a"), |_| {}).unwrap();
        graph.realize(":a").unwrap();

        graph.configure(":a", |t| t.depends_on("late")).unwrap();
        assert_eq!(graph.task(":a").unwrap().dependencies(), [":late".to_string()]);
    }

    #[test]
    fn children_dependencies_resolve_to_existing_tasks() {
        let mut graph = lazy();
        graph.add_project(":app").unwrap();
        graph.add_project(":lib").unwrap();
        graph.register(":app", desc("x"), |_| {}).unwrap();
        graph
            .register(ROOT_PROJECT, desc("x"), |t| t.depends_on_children("x"))
            .unwrap();

        assert_eq!(graph.dependencies(":x").unwrap(), vec![":app:x"]);
    }

    #[test]
    fn delegate_checks_children_at_realization() {
        let mut graph = lazy();
        graph.add_project(":app").unwrap();
        graph.add_project(":lib").unwrap();
        graph.register_delegate(ROOT_PROJECT, desc("x")).unwrap();
        assert!(!graph.any_child_has(ROOT_PROJECT, "x"));

        graph.register(":lib", desc("x"), |_| {}).unwrap();
        assert!(graph.any_child_has(ROOT_PROJECT, "x"));
        assert_eq!(graph.dependencies(":x").unwrap(), vec![":lib:x"]);
    }

    #[test]
    fn gate_disables_unwanted_bindings() {
        let mut graph = lazy();
        let binding = |repo: &str, publication: &str| PublishBinding {
            repository: repo.to_string(),
            publication: publication.to_string(),
        };
        graph
            .register_native(ROOT_PROJECT, desc("p1"), Some(binding("MavenA", "pub1")))
            .unwrap();
        graph
            .register_native(ROOT_PROJECT, desc("p2"), Some(binding("MavenB", "pub1")))
            .unwrap();
        graph.register_native(ROOT_PROJECT, desc("plain"), None).unwrap();

        let disabled = graph
            .gate_publications(ROOT_PROJECT, |b| b.repository == "MavenA")
            .unwrap();

        assert_eq!(disabled, 1);
        assert!(graph.task(":p1").unwrap().is_enabled());
        assert!(!graph.task(":p2").unwrap().is_enabled());
        assert!(graph.task(":plain").unwrap().is_enabled());
    }

    #[test]
    fn gate_applies_to_tasks_registered_later() {
        let mut graph = lazy();
        let binding = |repo: &str| PublishBinding {
            repository: repo.to_string(),
            publication: "pub1".to_string(),
        };
        let disabled = graph
            .gate_publications(ROOT_PROJECT, |b| b.repository == "MavenA")
            .unwrap();
        assert_eq!(disabled, 0);

        graph
            .register_native(ROOT_PROJECT, desc("p1"), Some(binding("MavenA")))
            .unwrap();
        graph
            .register_native(ROOT_PROJECT, desc("p2"), Some(binding("MavenB")))
            .unwrap();

        assert!(graph.task(":p1").unwrap().is_enabled());
        assert!(!graph.task(":p2").unwrap().is_enabled());
    }

    #[test]
    fn tree_labels_cross_project_nodes_with_paths() {
        let mut graph = lazy();
        graph.add_project(":app").unwrap();
        graph.register(":app", desc("leaf"), |_| {}).unwrap();
        graph
            .register(":app", desc("x"), |t| t.depends_on("leaf"))
            .unwrap();
        graph
            .register(ROOT_PROJECT, desc("x"), |t| t.depends_on_children("x"))
            .unwrap();

        assert_eq!(graph.tree(":x").unwrap().compact(), "x{:app:x{leaf}}");
    }

    #[test]
    fn tree_marks_missing_tasks() {
        let mut graph = lazy();
        graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("ghost"))
            .unwrap();

        let tree = graph.tree(":a").unwrap();
        assert!(tree.children[0].missing);
        assert_eq!(tree.to_string(), "a\n  ghost (missing)\n");
    }

    #[test]
    fn plan_orders_dependencies_first() {
        let mut graph = lazy();
        graph.register(ROOT_PROJECT, desc("c"), |_| {}).unwrap();
        graph
            .register(ROOT_PROJECT, desc("b"), |t| t.depends_on("c"))
            .unwrap();
        graph
            .register(ROOT_PROJECT, desc("a"), |t| {
                t.depends_on("b");
                t.depends_on("c");
            })
            .unwrap();

        let plan = graph.execution_plan(&[":a".to_string()]).unwrap();
        let order: Vec<_> = plan.iter().map(|t| t.path.as_str()).collect();
        assert_eq!(order, vec![":c", ":b", ":a"]);
    }

    #[test]
    fn plan_reports_unknown_dependency() {
        let mut graph = lazy();
        graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("ghost"))
            .unwrap();

        assert_eq!(
            graph.execution_plan(&[":a".to_string()]).unwrap_err(),
            PlanError::Task(TaskError::UnknownTask(":ghost".to_string()))
        );
    }

    #[test]
    fn plan_detects_cycles() {
        let mut graph = lazy();
        graph
            .register(ROOT_PROJECT, desc("a"), |t| t.depends_on("b"))
            .unwrap();
        graph
            .register(ROOT_PROJECT, desc("b"), |t| t.depends_on("a"))
            .unwrap();

        assert!(matches!(
            graph.execution_plan(&[":a".to_string()]),
            Err(PlanError::Cycle(_))
        ));
        assert!(matches!(graph.tree(":a"), Err(PlanError::Cycle(_))));
    }
}
