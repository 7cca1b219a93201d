//! Resolve command handler.

use super::{exit_codes, write_output, OutputTarget};
use crate::config::HostingConfig;
use crate::model::RepoRef;
use crate::resolve::{parse_repository_url, RegistryResolver};
use anyhow::{anyhow, Result};

/// Turn a command-line target into a repository reference.
///
/// Accepts `owner/repo`, GitHub URLs and npm package links; only npm links
/// cost a network request.
pub fn resolve_target(target: &str, hosting: &HostingConfig) -> Result<RepoRef> {
    if let Some(repo) = parse_repository_url(target) {
        return Ok(repo);
    }
    if !target.contains("://") {
        if let Ok(repo) = target.parse::<RepoRef>() {
            return Ok(repo);
        }
    }

    RegistryResolver::new(hosting)?
        .resolve(target)?
        .ok_or_else(|| anyhow!("Could not resolve a GitHub repository from '{target}'"))
}

/// Run the resolve command: print `owner/repo` for `url`.
pub fn run_resolve(url: &str, hosting: &HostingConfig) -> Result<i32> {
    let repo = resolve_target(url, hosting)?;
    write_output(&repo.to_string(), &OutputTarget::Stdout)?;
    Ok(exit_codes::SUCCESS)
}
