//! Gradle plugin declarations
//!
//! Plugin publications are declared to the plugin development plugin, and
//! the first of them supplies the Gradle Plugin Portal bundle metadata.

use serde::Serialize;
use tracing::warn;

use crate::domain::naming::{self, PUBLISH_PLUGINS_TASK};
use crate::domain::{Publication, TaskDescriptor};

use super::registry::{TaskError, TaskGraph};
use super::BuildError;

/// Descriptor of the native task publishing plugins to the portal
pub fn publish_plugins_task() -> TaskDescriptor {
    naming::native_task(
        PUBLISH_PLUGINS_TASK,
        "Publishes this plugin to the Gradle Plugin Portal.",
    )
}

/// One `gradlePlugin { plugins { ... } }` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    pub id: String,
    pub pub_name: String,
    pub implementation_class: String,
    pub display_name: String,
    pub description: String,
    pub group: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginPublishingModel {
    /// Publication whose plugin goes to the portal
    pub publishing_pub: String,
    pub entries: Vec<PluginEntry>,
    pub website: String,
    pub vcs_url: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl PluginPublishingModel {
    pub fn from_publications(project: &str, pubs: &[Publication]) -> Result<Self, BuildError> {
        let plugin_pubs: Vec<&Publication> = pubs.iter().filter(|p| p.is_gradle_plugin()).collect();
        let Some(first) = plugin_pubs.first() else {
            return Err(BuildError::NoPluginPublication(project.to_string()));
        };

        if plugin_pubs.len() > 1 {
            let names: Vec<String> = plugin_pubs.iter().map(|p| p.pub_name_with_variant()).collect();
            warn!(
                project,
                pubs = %names.join(", "),
                "More than one pub is declared to perform Gradle plugin publishing. \
                 Only the first one will be published to Gradle Plugin Portal."
            );
        }

        let entries = plugin_pubs.iter().filter_map(|p| entry_of(p)).collect();

        let pom = &first.pom;
        let website = pom.web.url.clone().unwrap_or_default();
        let plugin = pom.plugin.as_ref();

        Ok(Self {
            publishing_pub: first.pub_name_with_variant(),
            entries,
            vcs_url: pom.scm.url.clone().unwrap_or_else(|| website.clone()),
            website,
            description: plugin
                .and_then(|p| p.description.clone())
                .or_else(|| pom.description.clone())
                .unwrap_or_default(),
            tags: plugin.map(|p| p.tags.clone()).unwrap_or_default(),
        })
    }

    /// Registers the portal publishing task of the plugin-publish plugin
    pub fn register_tasks(&self, graph: &mut TaskGraph, project: &str) -> Result<(), TaskError> {
        graph.register_native(project, publish_plugins_task(), None)?;
        Ok(())
    }
}

fn entry_of(publication: &Publication) -> Option<PluginEntry> {
    let pom = &publication.pom;
    let plugin = pom.plugin.as_ref()?;
    Some(PluginEntry {
        id: pom.plugin_id()?.to_string(),
        pub_name: publication.pub_name_with_variant(),
        implementation_class: plugin.implementation_class.clone()?,
        display_name: plugin
            .display_name
            .clone()
            .unwrap_or_else(|| "Untitled plugin".to_string()),
        description: pom
            .description
            .clone()
            .unwrap_or_else(|| "Untitled component".to_string()),
        group: pom.group().to_string(),
        artifact_id: pom.artifact_id().to_string(),
        version: pom.version().to_string(),
    })
}
