//! Correctness: a proxy built from contributor volume, README presence and a
//! declared test script.

use super::{fetch_readme_text, EvalContext, MetricEvaluator, MetricKind, MetricOutcome, MANIFEST_PATH};
use crate::error::{NotFoundExt, ParseErrorKind, Result, TrustError};
use crate::hosting::HostingApi;
use std::sync::Arc;

const CONTRIBUTOR_PAGE: u8 = 100;
const CONTRIBUTOR_CAP: usize = 60;
const CONTRIBUTOR_DIVISOR: f64 = 200.0;
const README_WEIGHT: f64 = 0.2;
const TEST_SCRIPT_WEIGHT: f64 = 0.5;

/// Whether a `package.json` document declares a non-empty `scripts.test`.
pub fn declares_test_script(manifest: &str) -> Result<bool> {
    let value: serde_json::Value = serde_json::from_str(manifest).map_err(|e| {
        TrustError::parse(MANIFEST_PATH, ParseErrorKind::InvalidJson(e.to_string()))
    })?;
    Ok(value
        .get("scripts")
        .and_then(|scripts| scripts.get("test"))
        .and_then(serde_json::Value::as_str)
        .is_some_and(|script| !script.trim().is_empty()))
}

/// Correctness evaluator.
///
/// The three signals are checked independently; a failed check contributes
/// nothing. The outcome is unknown only when every check failed.
pub struct Correctness {
    client: Arc<dyn HostingApi>,
}

impl Correctness {
    pub fn new(client: Arc<dyn HostingApi>) -> Self {
        Self { client }
    }

    fn contributor_signal(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        ctx.cancel.check("listing contributors")?;
        let contributors = self.client.list_contributors(ctx.repo, CONTRIBUTOR_PAGE)?;
        Ok(contributors.len().min(CONTRIBUTOR_CAP) as f64 / CONTRIBUTOR_DIVISOR)
    }

    fn readme_signal(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        let present = match ctx.readme {
            Some(text) => !text.trim().is_empty(),
            None => fetch_readme_text(self.client.as_ref(), ctx.repo, ctx.cancel)?
                .is_some_and(|text| !text.trim().is_empty()),
        };
        Ok(if present { README_WEIGHT } else { 0.0 })
    }

    fn test_script_signal(&self, ctx: &EvalContext<'_>) -> Result<f64> {
        ctx.cancel.check("fetching package manifest")?;
        let Some(file) = self.client.file_content(ctx.repo, MANIFEST_PATH).found()? else {
            return Ok(0.0);
        };
        let Some(text) = file.decode_text()? else {
            return Ok(0.0);
        };
        Ok(if declares_test_script(&text)? {
            TEST_SCRIPT_WEIGHT
        } else {
            0.0
        })
    }
}

impl MetricEvaluator for Correctness {
    fn kind(&self) -> MetricKind {
        MetricKind::Correctness
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        let checks = [
            ("contributors", self.contributor_signal(ctx)),
            ("readme", self.readme_signal(ctx)),
            ("test script", self.test_script_signal(ctx)),
        ];

        let mut total = 0.0;
        let mut failures = Vec::new();
        for (name, result) in checks {
            match result {
                Ok(score) => total += score,
                Err(e) => {
                    tracing::debug!("{}: correctness {name} check failed: {e}", ctx.repo);
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if failures.len() == 3 {
            tracing::warn!("{}: correctness unavailable", ctx.repo);
            return MetricOutcome::Unknown(failures.join("; "));
        }
        MetricOutcome::Scored(total.min(1.0))
    }
}
