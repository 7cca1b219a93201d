//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler returns the process exit code; main.rs calls
//! `std::process::exit()` when it is non-zero.

mod config;
mod resolve;
mod score;

pub use config::{run_config, ConfigAction};
pub use resolve::{resolve_target, run_resolve};
pub use score::{run_score, OutputFormat, ScoreConfig};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Exit codes shared by every subcommand.
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// NetScore below the `--min-score` threshold
    pub const BELOW_THRESHOLD: i32 = 1;
    /// Any error
    pub const ERROR: i32 = 3;
}

/// Where command output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map_or(Self::Stdout, Self::File)
    }
}

/// Whether ANSI colors should be used.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none()
}

/// Write command output to stdout or a file.
pub fn write_output(content: &str, target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Output written to {}", path.display());
            Ok(())
        }
    }
}
