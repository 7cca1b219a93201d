//! Repository reference type shared by every layer.

use crate::error::{Result, TrustError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An `owner/repo` pair on the hosting service.
///
/// Construction rejects empty parts; that is the only input validation the
/// scoring core performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Create a reference, trimming whitespace and rejecting empty parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let owner = owner.into().trim().to_string();
        let repo = repo.into().trim().to_string();
        if owner.is_empty() {
            return Err(TrustError::invalid_input("repository owner must not be empty"));
        }
        if repo.is_empty() {
            return Err(TrustError::invalid_input("repository name must not be empty"));
        }
        Ok(Self { owner, repo })
    }

    /// Cache key of the form `owner/repo`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Cache key of the form `owner/repo/<subresource>`.
    #[must_use]
    pub fn subresource_key(&self, subresource: &str) -> String {
        format!("{}/{}/{subresource}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = TrustError;

    /// Parse the `owner/repo` short form.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().trim_matches('/').splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        if repo.contains('/') {
            return Err(TrustError::invalid_input(format!(
                "expected owner/repo, got '{s}'"
            )));
        }
        Self::new(owner, repo)
    }
}
