//! Turning package and repository links into `owner/repo` references.
//!
//! Resolution sits in front of the scorer; the scoring core never calls it.

use crate::model::RepoRef;

const GITHUB_HOST: &str = "github.com";
const NPM_HOSTS: [&str; 2] = ["www.npmjs.com", "npmjs.com"];

/// Parse a GitHub repository URL in any of the forms package manifests use.
///
/// Accepts `https://github.com/o/r`, `.git` suffixes, `git+https://`,
/// `git://`, `ssh://git@`, scp-style `git@github.com:o/r` and the `github:o/r`
/// shorthand. Returns `None` for anything else.
#[must_use]
pub fn parse_repository_url(input: &str) -> Option<RepoRef> {
    let input = input.trim();
    if let Some(path) = input.strip_prefix("github:") {
        return repo_from_path(path);
    }

    let rest = input.strip_prefix("git+").unwrap_or(input);
    let rest = ["https://", "http://", "git://", "ssh://"]
        .iter()
        .find_map(|scheme| rest.strip_prefix(scheme))
        .unwrap_or(rest);
    let rest = rest.strip_prefix("git@").unwrap_or(rest);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let path = rest.strip_prefix(GITHUB_HOST)?;
    let path = path
        .strip_prefix('/')
        .or_else(|| path.strip_prefix(':'))?;
    repo_from_path(path)
}

/// `owner/repo[.git][/more][?query][#fragment]` to a reference.
fn repo_from_path(path: &str) -> Option<RepoRef> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut parts = path.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    RepoRef::new(owner, repo).ok()
}

/// Package name from an npm package page link, scoped names included.
#[must_use]
pub fn npm_package_name(url: &str) -> Option<String> {
    let rest = url.trim();
    let rest = rest
        .strip_prefix("https://")
        .or_else(|| rest.strip_prefix("http://"))
        .unwrap_or(rest);
    let path = NPM_HOSTS.iter().find_map(|host| rest.strip_prefix(host))?;
    let path = path.strip_prefix("/package/")?;
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    if first.starts_with('@') {
        let name = segments.next()?;
        Some(format!("{first}/{name}"))
    } else {
        Some(first.to_string())
    }
}

/// Repository reference from an npm registry document's `repository` field,
/// which is either a URL string or an object with a `url`.
#[must_use]
pub fn repository_from_document(document: &serde_json::Value) -> Option<RepoRef> {
    let repository = document.get("repository")?;
    let url = repository
        .as_str()
        .or_else(|| repository.get("url").and_then(serde_json::Value::as_str))?;
    parse_repository_url(url)
}

#[cfg(feature = "github")]
pub use registry::RegistryResolver;

#[cfg(feature = "github")]
mod registry {
    use super::{npm_package_name, parse_repository_url, repository_from_document};
    use crate::config::HostingConfig;
    use crate::error::{HostingErrorKind, ParseErrorKind, Result, TrustError};
    use crate::model::RepoRef;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;

    const NPM_REGISTRY: &str = "https://registry.npmjs.org";

    /// Resolves GitHub and npm package links to repository references.
    pub struct RegistryResolver {
        client: Client,
        registry_base: String,
    }

    impl RegistryResolver {
        pub fn new(config: &HostingConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(config.timeout())
                .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| {
                    TrustError::hosting(
                        "Failed to create HTTP client",
                        HostingErrorKind::Network(e.to_string()),
                    )
                })?;
            Ok(Self {
                client,
                registry_base: NPM_REGISTRY.to_string(),
            })
        }

        /// Point at a different registry (mirrors, tests).
        #[must_use]
        pub fn with_registry_base(mut self, base: impl Into<String>) -> Self {
            self.registry_base = base.into().trim_end_matches('/').to_string();
            self
        }

        /// Resolve `url`; `Ok(None)` when it names no GitHub repository.
        pub fn resolve(&self, url: &str) -> Result<Option<RepoRef>> {
            if let Some(repo) = parse_repository_url(url) {
                return Ok(Some(repo));
            }
            let Some(name) = npm_package_name(url) else {
                tracing::debug!("{url} is neither a GitHub nor an npm link");
                return Ok(None);
            };
            self.lookup_npm(&name)
        }

        fn lookup_npm(&self, name: &str) -> Result<Option<RepoRef>> {
            let context = format!("npm registry lookup for {name}");
            let url = format!("{}/{}", self.registry_base, name.replace('/', "%2F"));
            tracing::debug!("GET {url}");

            let response = self.client.get(&url).send().map_err(|e| {
                TrustError::hosting(context.as_str(), HostingErrorKind::Network(e.to_string()))
            })?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(TrustError::hosting(
                    context,
                    HostingErrorKind::from_status(status.as_u16()),
                ));
            }

            let document: serde_json::Value = response.json().map_err(|e| {
                TrustError::parse(context.as_str(), ParseErrorKind::InvalidJson(e.to_string()))
            })?;
            let repo = repository_from_document(&document);
            if repo.is_none() {
                tracing::debug!("{name} declares no GitHub repository");
            }
            Ok(repo)
        }
    }
}
