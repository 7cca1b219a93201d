//! Hosting API response and query types.
//!
//! Field names follow the GitHub REST API; unknown fields are ignored.

use crate::error::{ParseErrorKind, Result, TrustError};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Responses
// ============================================================================

/// A repository contributor and their commit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub login: Option<String>,
    pub contributions: u64,
}

impl Contributor {
    /// Anonymous contributor with the given count.
    #[must_use]
    pub const fn with_contributions(contributions: u64) -> Self {
        Self {
            login: None,
            contributions,
        }
    }
}

/// License block of the repository metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// Subset of repository metadata used by the evaluators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub license: Option<LicenseInfo>,
}

impl RepoMetadata {
    /// The declared SPDX identifier, ignoring GitHub's `NOASSERTION` marker.
    #[must_use]
    pub fn spdx_id(&self) -> Option<&str> {
        self.license
            .as_ref()
            .and_then(|l| l.spdx_id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "NOASSERTION")
    }
}

/// A file or README payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Build a base64-encoded payload from plain text.
    #[must_use]
    pub fn from_text(path: &str, text: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            content: Some(base64::engine::general_purpose::STANDARD.encode(text)),
            encoding: Some("base64".to_string()),
        }
    }

    /// Decode the payload to text.
    ///
    /// Returns `Ok(None)` when the response carried no `content` field.
    /// Base64 payloads may contain line breaks, which are stripped first.
    pub fn decode_text(&self) -> Result<Option<String>> {
        let Some(content) = self.content.as_deref() else {
            return Ok(None);
        };

        match self.encoding.as_deref() {
            Some("base64") | None => {
                let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| {
                        TrustError::parse(
                            "file content",
                            ParseErrorKind::InvalidBase64(e.to_string()),
                        )
                    })?;
                Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Some(_) => Ok(Some(content.to_string())),
        }
    }
}

/// Minimal user reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A pull request summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

/// A pull request review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// An issue. The issues endpoint also lists pull requests, which carry a
/// `pull_request` marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    /// Whether this entry is a pull request rather than an issue.
    #[must_use]
    pub const fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Relationship of a commenter to the repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation {
    Collaborator,
    Contributor,
    FirstTimer,
    FirstTimeContributor,
    Mannequin,
    Member,
    Owner,
    #[default]
    None,
    #[serde(other)]
    Unknown,
}

impl AuthorAssociation {
    /// Collaborators, members, owners and contributors count as maintainers.
    #[must_use]
    pub const fn is_maintainer(self) -> bool {
        matches!(
            self,
            Self::Collaborator | Self::Member | Self::Owner | Self::Contributor
        )
    }
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub user: Option<User>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author_association: AuthorAssociation,
}

// ============================================================================
// Queries
// ============================================================================

/// Issue / pull request state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Open,
    Closed,
    All,
}

impl ItemState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Parameters for listing pull requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestQuery {
    pub state: ItemState,
    /// Sort field (`created`, `updated`, ...); descending order is implied.
    pub sort: &'static str,
    pub per_page: u8,
    pub page: u32,
}

impl PullRequestQuery {
    /// Most recently updated closed pull requests, first page.
    #[must_use]
    pub const fn recently_closed(per_page: u8) -> Self {
        Self {
            state: ItemState::Closed,
            sort: "updated",
            per_page,
            page: 1,
        }
    }
}

/// Parameters for listing issues, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueQuery {
    pub state: ItemState,
    pub since: Option<DateTime<Utc>>,
    pub per_page: u8,
    pub page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_with_line_breaks() {
        // GitHub wraps base64 at 60 columns
        let file = FileContent {
            path: Some("README.md".to_string()),
            content: Some("IyBIZWxs\nbyB3b3Js\nZA==\n".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(file.decode_text().unwrap().as_deref(), Some("# Hello world"));
    }

    #[test]
    fn test_decode_text_missing_content() {
        let file = FileContent::default();
        assert_eq!(file.decode_text().unwrap(), None);
    }

    #[test]
    fn test_decode_text_invalid_base64() {
        let file = FileContent {
            content: Some("!!not-base64!!".to_string()),
            encoding: Some("base64".to_string()),
            ..FileContent::default()
        };
        assert!(file.decode_text().is_err());
    }

    #[test]
    fn test_from_text_round_trips() {
        let file = FileContent::from_text("package.json", "{\"name\":\"x\"}");
        assert_eq!(file.decode_text().unwrap().as_deref(), Some("{\"name\":\"x\"}"));
    }

    #[test]
    fn test_author_association_deserialization() {
        let owner: AuthorAssociation = serde_json::from_str("\"OWNER\"").unwrap();
        assert!(owner.is_maintainer());
        let first: AuthorAssociation = serde_json::from_str("\"FIRST_TIME_CONTRIBUTOR\"").unwrap();
        assert!(!first.is_maintainer());
        let odd: AuthorAssociation = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(odd, AuthorAssociation::Unknown);
    }

    #[test]
    fn test_spdx_id_ignores_noassertion() {
        let meta = RepoMetadata {
            license: Some(LicenseInfo {
                spdx_id: Some("NOASSERTION".to_string()),
                ..LicenseInfo::default()
            }),
            ..RepoMetadata::default()
        };
        assert_eq!(meta.spdx_id(), None);
    }

    #[test]
    fn test_issue_pull_request_marker() {
        let json = r#"{"number": 3, "created_at": "2024-01-02T03:04:05Z",
                      "pull_request": {"url": "https://example"}}"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert!(issue.is_pull_request());
    }
}
