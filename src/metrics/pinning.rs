//! Dependency pinning: how tightly the package manifest pins its dependencies.

use super::{EvalContext, MetricEvaluator, MetricKind, MetricOutcome, MANIFEST_PATH};
use crate::cache::{CacheStats, TtlCache};
use crate::error::{NotFoundExt, ParseErrorKind, Result, TrustError};
use crate::hosting::HostingApi;
use crate::retry::RetryPolicy;
use indexmap::IndexMap;
use semver::{Version, VersionReq};
use std::sync::Arc;

/// Dependency sections merged from the manifest, in override order.
const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "devDependencies", "peerDependencies"];

/// Distribution tags treated like exact versions.
const KNOWN_TAGS: [&str; 3] = ["latest", "next", "stable"];

/// Prefixes of version specs that point at a repository or a local path.
const SOURCE_PREFIXES: &[&str] = &[
    "git+", "git://", "git@", "github:", "gitlab:", "bitbucket:", "file:", "link:", "./", "../",
    "/", "http://", "https://",
];

/// How a dependency version spec pins its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    /// Exact version or a distribution tag
    Exact,
    /// `^x.y.z`
    Caret,
    /// `~x.y.z`
    Tilde,
    /// Anything containing a space (`>=1 <2`, `1 - 2`, `^1 || ^2`)
    Range,
    /// Git URL, tarball URL or local path
    Source,
    /// Any other valid semver requirement (`*`, `1.x`, `>=1.2`)
    Loose,
    /// Not understood
    Unrecognized,
}

impl PinKind {
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::Caret => 0.8,
            Self::Tilde => 0.6,
            Self::Source => 0.5,
            Self::Range => 0.4,
            Self::Loose => 0.3,
            Self::Unrecognized => 0.0,
        }
    }
}

/// Classify one version spec. Checks run in a fixed precedence order.
#[must_use]
pub fn classify_version_spec(spec: &str) -> PinKind {
    let spec = spec.trim();
    if KNOWN_TAGS.contains(&spec) || is_exact_version(spec) {
        PinKind::Exact
    } else if spec.starts_with('^') {
        PinKind::Caret
    } else if spec.starts_with('~') {
        PinKind::Tilde
    } else if spec.contains(' ') {
        PinKind::Range
    } else if is_source_reference(spec) {
        PinKind::Source
    } else if !spec.is_empty() && VersionReq::parse(spec).is_ok() {
        PinKind::Loose
    } else {
        PinKind::Unrecognized
    }
}

fn is_exact_version(spec: &str) -> bool {
    let bare = spec.strip_prefix('=').unwrap_or(spec).trim();
    let bare = bare.strip_prefix('v').unwrap_or(bare);
    Version::parse(bare).is_ok()
}

fn is_source_reference(spec: &str) -> bool {
    // `user/repo` is GitHub shorthand
    SOURCE_PREFIXES.iter().any(|prefix| spec.starts_with(prefix)) || spec.contains('/')
}

/// Merge the dependency sections of a manifest; later sections override
/// earlier ones for the same package name.
#[must_use]
pub fn merged_dependencies(manifest: &serde_json::Value) -> IndexMap<String, String> {
    let mut merged = IndexMap::new();
    for section in DEPENDENCY_SECTIONS {
        let Some(entries) = manifest.get(section).and_then(serde_json::Value::as_object) else {
            continue;
        };
        for (name, spec) in entries {
            let spec = spec.as_str().unwrap_or_default().to_string();
            merged.insert(name.clone(), spec);
        }
    }
    merged
}

/// Mean pin weight over all dependencies; an empty map scores 0.
#[must_use]
pub fn pinning_score(dependencies: &IndexMap<String, String>) -> f64 {
    if dependencies.is_empty() {
        return 0.0;
    }
    let total: f64 = dependencies
        .values()
        .map(|spec| classify_version_spec(spec).weight())
        .sum();
    (total / dependencies.len() as f64).min(1.0)
}

/// Dependency pinning evaluator. Cached per `owner/repo`.
pub struct DependencyPinning {
    client: Arc<dyn HostingApi>,
    cache: TtlCache<f64>,
    retry: RetryPolicy,
    cache_failures: bool,
}

impl DependencyPinning {
    pub fn new(client: Arc<dyn HostingApi>, cache: TtlCache<f64>, retry: RetryPolicy) -> Self {
        Self {
            client,
            cache,
            retry,
            cache_failures: false,
        }
    }

    /// Also cache the 0 recorded for a failed evaluation.
    #[must_use]
    pub const fn cache_failures(mut self, enabled: bool) -> Self {
        self.cache_failures = enabled;
        self
    }

    fn compute(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        let file = self
            .retry
            .run(ctx.cancel, "fetching package manifest", || {
                self.client.file_content(ctx.repo, MANIFEST_PATH)
            })
            .found()?;

        let Some(text) = file.map(|f| f.decode_text()).transpose()?.flatten() else {
            tracing::debug!("{}: no package manifest", ctx.repo);
            return Ok(0.0);
        };

        let manifest: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            TrustError::parse(MANIFEST_PATH, ParseErrorKind::InvalidJson(e.to_string()))
        })?;
        let dependencies = merged_dependencies(&manifest);
        tracing::debug!("{}: {} declared dependencies", ctx.repo, dependencies.len());
        Ok(pinning_score(&dependencies))
    }
}

impl MetricEvaluator for DependencyPinning {
    fn kind(&self) -> MetricKind {
        MetricKind::DependencyPinning
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        let key = ctx.repo.cache_key();
        if let Some(score) = self.cache.get(&key) {
            tracing::debug!("{key}: dependency pinning served from cache");
            return MetricOutcome::Scored(score);
        }

        match self.compute(ctx) {
            Ok(score) => {
                self.cache.insert(key, score);
                MetricOutcome::Scored(score)
            }
            Err(e) => {
                tracing::warn!("{}: dependency pinning unavailable: {e}", ctx.repo);
                if self.cache_failures && !e.is_cancelled() {
                    self.cache.insert(key, 0.0);
                }
                MetricOutcome::Unknown(e.to_string())
            }
        }
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.cache.stats())
    }
}
