//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use super::output::{Output, OutputFormat};
use super::{inspect, tasks};
use crate::graph::RegistrationMode;
use crate::storage::{env_properties, Descriptor, Workspace, WorkspaceOptions, DESCRIPTOR_FILE};

#[derive(Parser)]
#[command(name = "jarbird")]
#[command(author, version, about = "Plans multi-destination publishing task graphs for JVM libraries")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root (defaults to the nearest directory with jarbird.toml)
    #[arg(long, global = true, env = "JARBIRD_ROOT")]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Overrides when task configuration runs
    #[arg(long, global = true)]
    pub registration: Option<RegistrationMode>,

    /// User-level properties file (defaults to gradle.properties in the config dir)
    #[arg(long, global = true, env = "JARBIRD_USER_PROPERTIES")]
    pub user_properties: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered tasks
    Tasks {
        /// Only tasks of this project
        #[arg(long, short)]
        project: Option<String>,

        /// Include native publishing and documentation tasks
        #[arg(long)]
        all: bool,
    },

    /// Show the dependency tree of a task
    Graph {
        /// Task name or path
        #[arg(default_value = "jbPublish")]
        task: String,

        /// Project of the task when a bare name is given
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Show the execution order of tasks
    Plan {
        /// Task names or paths
        #[arg(default_value = "jbPublish")]
        tasks: Vec<String>,

        /// Project of the tasks given by bare name
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Show the repositories each publication targets
    Repos {
        /// Only this project
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Show the signing decision of each publication
    Signing {
        /// Only this project
        #[arg(long, short)]
        project: Option<String>,
    },

    /// Validate the workspace configuration and task graph
    Check,
}

impl Cli {
    fn workspace_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Descriptor::find_root(&cwd).ok_or_else(|| {
            anyhow::anyhow!("Not in a jarbird workspace: no {} found", DESCRIPTOR_FILE)
        })
    }

    /// Loads and configures the workspace
    pub fn open_workspace(&self) -> Result<Workspace> {
        let root = self.workspace_root()?;
        debug!(root = %root.display(), "opening workspace");

        let options = WorkspaceOptions {
            user_properties: self
                .user_properties
                .clone()
                .or_else(Descriptor::user_properties_path),
            env: env_properties(std::env::vars()),
            registration: self.registration,
        };
        Workspace::configure(&root, &options)
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    super::init_logging(cli.verbose);
    let output = Output::new(cli.format);
    let mut workspace = cli.open_workspace()?;

    match &cli.command {
        Commands::Tasks { project, all } => {
            tasks::list(&output, &workspace, project.as_deref(), *all)?
        }
        Commands::Graph { task, project } => {
            tasks::graph(&output, &mut workspace, task, project.as_deref())?
        }
        Commands::Plan { tasks: names, project } => {
            tasks::plan(&output, &mut workspace, names, project.as_deref())?
        }
        Commands::Repos { project } => inspect::repos(&output, &workspace, project.as_deref())?,
        Commands::Signing { project } => {
            inspect::signing(&output, &workspace, project.as_deref())?
        }
        Commands::Check => inspect::check(&output, &mut workspace)?,
    }

    Ok(())
}
