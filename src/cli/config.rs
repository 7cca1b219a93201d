//! Config command handler.

use super::{exit_codes, write_output, OutputTarget};
use crate::config::{generate_example_config, generate_json_schema, load_or_default, Validatable};
use anyhow::{Context, Result};
use std::path::Path;

/// What the `config` subcommand prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigAction {
    /// JSON Schema of the configuration file
    Schema,
    /// Commented example configuration file
    Example,
    /// The effective configuration (file merged over defaults)
    Show,
}

/// Run the config command.
pub fn run_config(action: ConfigAction, explicit_path: Option<&Path>) -> Result<i32> {
    let text = match action {
        ConfigAction::Schema => generate_json_schema()?,
        ConfigAction::Example => generate_example_config(),
        ConfigAction::Show => render_effective_config(explicit_path)?,
    };
    write_output(&text, &OutputTarget::Stdout)?;
    Ok(exit_codes::SUCCESS)
}

fn render_effective_config(explicit_path: Option<&Path>) -> Result<String> {
    let (config, source) = load_or_default(explicit_path);
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;

    let mut lines = vec![match source {
        Some(path) => format!("# loaded from {}", path.display()),
        None => "# no config file found; showing defaults".to_string(),
    }];
    for problem in config.validate() {
        lines.push(format!("# warning: {problem}"));
    }
    lines.push(yaml);
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo-trust.yaml");
        std::fs::write(&path, "responsiveness:\n  max_issues: 0\n").unwrap();

        let text = render_effective_config(Some(&path)).unwrap();
        assert!(text.starts_with("# loaded from"));
        assert!(text.contains("# warning: responsiveness.max_issues"));
        assert!(text.contains("max_issues: 0"));
    }
}
