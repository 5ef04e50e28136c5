//! Output formatting for CLI commands

use anyhow::Result;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Renders command reports in the selected format
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints `report` as one JSON line, or hands it to `text` for humans
    pub fn report<T, F>(&self, report: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T),
    {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
            OutputFormat::Text => text(report),
        }
        Ok(())
    }

    /// Separates text sections
    pub fn blank(&self) {
        if self.format == OutputFormat::Text {
            println!();
        }
    }
}
