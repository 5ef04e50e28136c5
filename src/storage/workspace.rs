//! Workspace configuration
//!
//! Loads the descriptor, declares the publications of every project, then
//! configures the task graph:
//!
//! 1. extensions are finalized parents first, so a child sees the final
//!    repos of its parent;
//! 2. tasks are built children first, so a multi-project root can delegate
//!    to the tasks its children registered.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{
    ConfigError, Extension, PomGroup, ProjectInfo, PubScope, Publication, RepoError, RepoSet,
    RepoSpecBuilder, VariantMode,
};
use crate::graph::{
    ArtifactoryModel, BintrayPublishPlan, BuildError, DocsBuilder, PluginPublishingModel,
    PublishingModel, RegistrationMode, SigningPlan, SigningProperties, TaskBuilder, TaskGraph,
    ROOT_PROJECT,
};

use super::config::{Descriptor, ProjectEntry, PubEntry, RepoDecl};
use super::pom_loader::load_layer;
use super::properties::{read_properties, LayeredProperties, PROPERTIES_FILE};

/// Inputs of a workspace that do not come from its files
#[derive(Debug, Clone, Default)]
pub struct WorkspaceOptions {
    /// User-level properties file
    pub user_properties: Option<PathBuf>,
    /// `ORG_GRADLE_PROJECT_` properties, prefix already stripped
    pub env: HashMap<String, String>,
    /// Overrides the registration mode of the descriptor
    pub registration: Option<RegistrationMode>,
}

/// Publishing configuration of one project after the graph is built
#[derive(Debug, Clone, Serialize)]
pub struct ProjectModel {
    pub path: String,
    pub dir: PathBuf,
    /// Root that only delegates to its children
    pub aggregating: bool,
    pub repos: RepoSet,
    pub publications: Vec<Publication>,
    pub publishing: Option<PublishingModel>,
    pub plugin: Option<PluginPublishingModel>,
    pub artifactory: Option<ArtifactoryModel>,
    pub bintray: BintrayPublishPlan,
    pub signing: SigningPlan,
    pub doc_task: Option<String>,
}

/// A configured workspace
pub struct Workspace {
    root: PathBuf,
    descriptor: Descriptor,
    graph: TaskGraph,
    projects: Vec<ProjectModel>,
}

fn apply_project_repos(ext: &mut Extension, decl: &RepoDecl) -> Result<(), ConfigError> {
    if decl.maven_central {
        ext.maven_central()?;
    }
    for key in &decl.maven {
        ext.maven_repo(key)?;
    }
    if decl.maven_local {
        ext.maven_local()?;
    }
    if decl.gradle_portal {
        ext.gradle_portal()?;
    }
    if let Some(key) = &decl.artifactory {
        ext.artifactory(key)?;
    }
    if decl.bintray {
        ext.bintray()?;
    }
    Ok(())
}

fn apply_pub(scope: &mut PubScope<'_>, entry: &PubEntry) -> Result<(), ConfigError> {
    match entry.variant_mode {
        Some(VariantMode::WithVersion) => scope.variant_with_version(),
        Some(VariantMode::WithArtifactId) => scope.variant_with_artifact_id(),
        Some(VariantMode::Invisible) => scope.variant_invisible(),
        None => {}
    }
    if let Some(enabled) = entry.signing {
        scope.signing(enabled);
    }
    if let Some(sign_with) = entry.sign_with {
        scope.sign_with(sign_with);
    }
    if let Some(component) = &entry.component {
        scope.component(component);
    }
    if let Some(source_set) = &entry.source_set {
        scope.source_set(source_set);
    }

    let decl = &entry.repos;
    if decl.maven_central {
        scope.maven_central();
    }
    for key in &decl.maven {
        scope.maven_repo(key)?;
    }
    if decl.maven_local {
        scope.maven_local();
    }
    if decl.gradle_portal {
        scope.gradle_portal();
    }
    if let Some(key) = &decl.artifactory {
        scope.artifactory(key)?;
    }
    if decl.bintray {
        scope.bintray()?;
    }
    Ok(())
}

fn default_repos(decl: &RepoDecl, props: &LayeredProperties) -> Result<RepoSet, RepoError> {
    let builder = RepoSpecBuilder::new(props);
    let mut repos = RepoSet::new();
    if decl.maven_central {
        repos.insert(builder.maven_central());
    }
    for key in &decl.maven {
        repos.insert(builder.maven_repo(key)?);
    }
    if decl.maven_local {
        repos.insert(builder.maven_local());
    }
    if decl.gradle_portal {
        repos.insert(builder.gradle_portal());
    }
    if let Some(key) = &decl.artifactory {
        repos.insert(builder.artifactory(key)?);
    }
    if decl.bintray {
        repos.insert(builder.bintray()?);
    }
    Ok(repos)
}

/// Per-project task wiring, the project's publications already finalized
fn build_project(
    graph: &mut TaskGraph,
    path: &str,
    ext: &Extension,
) -> Result<ProjectParts, BuildError> {
    let pubs = ext.publications();
    let mut parts = ProjectParts {
        bintray: BintrayPublishPlan::new(pubs),
        signing: SigningPlan::new(pubs, SigningProperties::from_source(ext.properties())),
        ..ProjectParts::default()
    };

    if !pubs.is_empty() {
        let publishing = PublishingModel::from_publications(pubs)?;
        publishing.register_tasks(graph, path)?;
        parts.publishing = Some(publishing);

        DocsBuilder::new(path, pubs)
            .with_doc_generator(ext.doc_generator())
            .register(graph)?;

        if pubs.iter().any(Publication::is_gradle_plugin) {
            let plugin = PluginPublishingModel::from_publications(path, pubs)?;
            plugin.register_tasks(graph, path)?;
            parts.plugin = Some(plugin);
        }

        parts.artifactory = ArtifactoryModel::from_publications(pubs)?;
        if let Some(artifactory) = &parts.artifactory {
            artifactory.register_tasks(graph, path)?;
        }
        parts.bintray.register_tasks(graph, path)?;
    }

    TaskBuilder::new(path, pubs).build(graph)?;
    Ok(parts)
}

#[derive(Default)]
struct ProjectParts {
    publishing: Option<PublishingModel>,
    plugin: Option<PluginPublishingModel>,
    artifactory: Option<ArtifactoryModel>,
    bintray: BintrayPublishPlan,
    signing: SigningPlan,
}

impl Workspace {
    /// Loads and configures the workspace rooted at `root`
    pub fn configure(root: &Path, options: &WorkspaceOptions) -> Result<Self> {
        let descriptor = Descriptor::load(root)?;
        Self::from_descriptor(root, descriptor, options)
    }

    /// Configures a workspace from an already parsed descriptor
    pub fn from_descriptor(
        root: &Path,
        descriptor: Descriptor,
        options: &WorkspaceOptions,
    ) -> Result<Self> {
        let mode = options
            .registration
            .unwrap_or(descriptor.settings.registration);
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let root_props = read_properties(&root.join(PROPERTIES_FILE))?;
        let user_props = match &options.user_properties {
            Some(path) => read_properties(path)?,
            None => HashMap::new(),
        };
        let root_poms = load_layer(root)?;

        let mut graph = TaskGraph::new(mode);
        let mut extensions: Vec<(&ProjectEntry, Extension, bool)> = Vec::new();
        let mut finalized: HashMap<String, RepoSet> = HashMap::new();

        // projects are sorted parents first
        for entry in &descriptor.projects {
            if entry.path != ROOT_PROJECT {
                graph.add_project(&entry.path)?;
            }
            let dir = root.join(entry.dir());

            let mut props = LayeredProperties::new();
            if entry.path != ROOT_PROJECT {
                props = props.with_layer(read_properties(&dir.join(PROPERTIES_FILE))?);
            }
            let props = props
                .with_layer(root_props.clone())
                .with_layer(user_props.clone())
                .with_layer(options.env.clone());

            let mut layers = vec![root_poms.clone()];
            if entry.path != ROOT_PROJECT {
                layers.push(load_layer(&dir)?);
            }
            let info = ProjectInfo {
                name: entry.name_or(&root_name),
                group: entry.group.clone(),
                version: entry.version.clone(),
                description: entry.description.clone(),
            };

            let defaults = default_repos(&descriptor.settings.default_repos, &props)
                .with_context(|| format!("Invalid default repos for project '{}'", entry.path))?;
            let mut ext = Extension::new(
                entry.path.clone(),
                Box::new(props),
                Box::new(PomGroup::new(layers, info)),
            )
            .with_default_repos(defaults);

            Self::declare(&mut ext, entry)
                .with_context(|| format!("Failed to configure project '{}'", entry.path))?;

            let aggregating = entry.path == ROOT_PROJECT
                && descriptor.is_multi_project()
                && entry.pubs.is_empty();
            let result = if aggregating {
                ext.finalize_aggregate()
            } else {
                let parent = entry.parent_path().and_then(|p| finalized.get(&p));
                ext.finalize(parent)
            };
            result.with_context(|| format!("Failed to finalize project '{}'", entry.path))?;

            finalized.insert(entry.path.clone(), ext.repos().clone());
            extensions.push((entry, ext, aggregating));
        }

        let mut projects = Vec::with_capacity(extensions.len());
        for (entry, ext, aggregating) in extensions.iter().rev() {
            debug!(project = %entry.path, "building tasks");
            let parts = build_project(&mut graph, &entry.path, ext)
                .with_context(|| format!("Failed to build tasks of project '{}'", entry.path))?;

            projects.push(ProjectModel {
                path: entry.path.clone(),
                dir: entry.dir(),
                aggregating: *aggregating,
                repos: ext.repos().clone(),
                publications: ext.publications().to_vec(),
                publishing: parts.publishing,
                plugin: parts.plugin,
                artifactory: parts.artifactory,
                bintray: parts.bintray,
                signing: parts.signing,
                doc_task: ext.doc_generator().map(str::to_string),
            });
        }
        projects.reverse();

        info!(
            root = %root.display(),
            projects = projects.len(),
            ?mode,
            "configured workspace"
        );

        Ok(Self {
            root: root.to_path_buf(),
            descriptor,
            graph,
            projects,
        })
    }

    fn declare(ext: &mut Extension, entry: &ProjectEntry) -> Result<(), ConfigError> {
        if let Some(task) = &entry.doc_task {
            ext.set_doc_generator(task.clone());
        }
        apply_project_repos(ext, &entry.repos)?;
        for pub_entry in &entry.pubs {
            ext.publication(&pub_entry.variant, |scope| apply_pub(scope, pub_entry))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// The graph, mutable because queries realize lazy tasks
    pub fn graph_mut(&mut self) -> &mut TaskGraph {
        &mut self.graph
    }

    /// Projects, parents first
    pub fn projects(&self) -> &[ProjectModel] {
        &self.projects
    }

    pub fn project(&self, path: &str) -> Option<&ProjectModel> {
        self.projects.iter().find(|p| p.path == path)
    }
}
