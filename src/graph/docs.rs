//! Sources and documentation jars

use crate::domain::naming::{self, DOCUMENTATION_GROUP};
use crate::domain::{Publication, TaskDescriptor};

use super::registry::{TaskError, TaskGraph};

pub struct DocsBuilder<'a> {
    project: &'a str,
    pubs: &'a [Publication],
    doc_generator: Option<&'a str>,
}

impl<'a> DocsBuilder<'a> {
    pub fn new(project: &'a str, pubs: &'a [Publication]) -> Self {
        Self {
            project,
            pubs,
            doc_generator: None,
        }
    }

    /// Task whose output goes into the doc jars
    pub fn with_doc_generator(mut self, task: Option<&'a str>) -> Self {
        self.doc_generator = task;
        self
    }

    /// Registers `sourcesJar<Pub>` and `jbDokkaJar<Pub>` for every publication
    ///
    /// Without a doc generator the doc jar is an empty placeholder, which
    /// still satisfies repositories requiring a javadoc artifact.
    pub fn register(&self, graph: &mut TaskGraph) -> Result<(), TaskError> {
        if self.pubs.is_empty() {
            return Ok(());
        }
        if let Some(generator) = self.doc_generator {
            let descriptor =
                TaskDescriptor::new(DOCUMENTATION_GROUP, generator, "Generates API documentation");
            graph.register_native(self.project, descriptor, None)?;
        }

        for publication in self.pubs {
            let id = publication.identity();

            graph.register(self.project, naming::sources_jar(&id), |_| {})?;

            let generator = self.doc_generator.map(str::to_string);
            graph.register(self.project, naming::dokka_jar(&id), move |task| {
                if let Some(generator) = generator {
                    task.depends_on(generator);
                }
            })?;
        }
        Ok(())
    }
}
