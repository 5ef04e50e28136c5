//! Jarbird - publishing task graphs for JVM library builds
//!
//! Jarbird takes the publications of a multi-project build and the
//! repositories they target (Maven Local, custom Maven repositories, Maven
//! Central, Artifactory, the Gradle Plugin Portal, Bintray) and synthesizes
//! the task graph rooted at `jbPublish` that publishes everything in the
//! right order.
//!
//! - [`domain`] - Repos, POMs, publications, project extensions, task naming
//! - [`graph`] - Task registry and the builders wiring the graph
//! - [`storage`] - Workspace descriptor, POM and properties files
//! - [`cli`] - Command-line interface

pub mod domain;
pub mod graph;
pub mod storage;
pub mod cli;

pub use domain::{Extension, Publication, RepoSet, RepoSpec};
pub use graph::{TaskBuilder, TaskGraph};
pub use storage::Workspace;
