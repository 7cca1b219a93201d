//! License compatibility.

use super::{EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
use crate::hosting::HostingApi;
use std::sync::Arc;

/// SPDX identifiers accepted from repository metadata.
pub const APPROVED_SPDX_IDS: &[&str] = &["MIT", "LGPL", "Apache-1.0", "Apache-1.1"];

/// License names accepted when scanning README text.
pub const APPROVED_LICENSE_NAMES: &[&str] = &[
    "MIT",
    "GNU Lesser General Public License",
    "Apache License 1.0",
    "Apache License 1.1",
];

/// Whether `id` is an approved SPDX identifier.
///
/// `LGPL` covers the versioned family (`LGPL-2.1-only`, `LGPL-3.0-or-later`).
#[must_use]
pub fn is_approved_spdx_id(id: &str) -> bool {
    let id = id.trim();
    id == "LGPL" || id.starts_with("LGPL-") || APPROVED_SPDX_IDS.contains(&id)
}

/// Whether README text names an approved license (literal substring match).
#[must_use]
pub fn readme_mentions_approved_license(readme: &str) -> bool {
    APPROVED_LICENSE_NAMES
        .iter()
        .any(|name| readme.contains(name))
}

/// License evaluator.
///
/// Uses the declared identifier when there is one and the README scan only
/// when the metadata has no identifier or could not be fetched.
pub struct License {
    client: Arc<dyn HostingApi>,
}

impl License {
    pub fn new(client: Arc<dyn HostingApi>) -> Self {
        Self { client }
    }

    fn readme_fallback(ctx: &EvalContext<'_>) -> MetricOutcome {
        let approved = readme_mentions_approved_license(ctx.readme.unwrap_or_default());
        MetricOutcome::Scored(if approved { 1.0 } else { 0.0 })
    }
}

impl MetricEvaluator for License {
    fn kind(&self) -> MetricKind {
        MetricKind::License
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        if let Err(e) = ctx.cancel.check("fetching repository metadata") {
            return MetricOutcome::Unknown(e.to_string());
        }

        match self.client.repository(ctx.repo) {
            Ok(metadata) => match metadata.spdx_id() {
                Some(id) => {
                    let approved = is_approved_spdx_id(id);
                    tracing::debug!("{}: declared license {id} (approved: {approved})", ctx.repo);
                    MetricOutcome::Scored(if approved { 1.0 } else { 0.0 })
                }
                None => Self::readme_fallback(ctx),
            },
            Err(e) if e.is_cancelled() => MetricOutcome::Unknown(e.to_string()),
            Err(e) => {
                tracing::debug!("{}: repository metadata unavailable, scanning README: {e}", ctx.repo);
                Self::readme_fallback(ctx)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_identifiers() {
        assert!(is_approved_spdx_id("MIT"));
        assert!(is_approved_spdx_id("Apache-1.1"));
        assert!(is_approved_spdx_id("LGPL-2.1-only"));
        assert!(!is_approved_spdx_id("Apache-2.0"));
        assert!(!is_approved_spdx_id("GPL-3.0"));
        assert!(!is_approved_spdx_id("MIT-0"));
    }

    #[test]
    fn test_readme_scan() {
        assert!(readme_mentions_approved_license("## License\n\nReleased under the MIT license."));
        assert!(readme_mentions_approved_license(
            "Licensed under the GNU Lesser General Public License v3"
        ));
        assert!(!readme_mentions_approved_license("Apache License 2.0"));
        assert!(!readme_mentions_approved_license(""));
    }
}
