//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `tasks` | List registered tasks by group |
//! | `graph [TASK]` | Dependency tree below a task |
//! | `plan [TASK...]` | Execution order of tasks |
//! | `repos` | Repositories targeted by each publication |
//! | `signing` | Signing decision of each publication |
//! | `check` | Validate configuration and task graph |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) to log configuration decisions at debug level:
//! ```bash
//! jarbird --verbose graph jbPublish
//! ```
//! `RUST_LOG` overrides the level when set.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod tasks;
mod inspect;

use tracing_subscriber::EnvFilter;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

/// Installs the stderr log subscriber; warnings only unless verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "jarbird=debug" } else { "jarbird=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second init in the same process keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
