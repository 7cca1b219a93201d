//! Code-hosting API access.
//!
//! The scoring engine consumes the [`HostingApi`] trait. With the `github`
//! feature (on by default) a [`GitHubClient`] backed by `reqwest` is
//! available.

#[cfg(feature = "github")]
mod github;
mod traits;
mod types;

#[cfg(feature = "github")]
pub use github::GitHubClient;
pub use traits::HostingApi;
pub use types::{
    AuthorAssociation, Contributor, FileContent, Issue, IssueComment, IssueQuery, ItemState,
    LicenseInfo, PullRequest, PullRequestQuery, RepoMetadata, Review, User,
};
