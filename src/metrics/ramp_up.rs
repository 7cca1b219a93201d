//! Ramp-up: how much onboarding documentation the README carries.

use super::{fetch_readme_text, round_to, EvalContext, MetricEvaluator, MetricKind, MetricOutcome};
use crate::hosting::HostingApi;
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Documentation sections and their weights.
pub const SECTIONS: &[(&str, f64)] = &[
    ("Installation", 0.2),
    ("Introduction", 0.2),
    ("Usage", 0.2),
    ("Contributing", 0.1),
    ("Contributions", 0.1),
    ("Getting Started", 0.2),
    ("Documentation", 0.1),
    ("License", 0.1),
    ("Support", 0.1),
];

static SECTION_PATTERNS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    SECTIONS
        .iter()
        .filter_map(|(name, weight)| {
            Regex::new(&format!(r"(?i)#\s*{}", regex::escape(name)))
                .ok()
                .map(|re| (re, *weight))
        })
        .collect()
});

/// Sum the weights of the sections with a markdown heading, capped at 1 and
/// rounded to 2 decimals.
#[must_use]
pub fn ramp_up_score(readme: &str) -> f64 {
    let total: f64 = SECTION_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(readme))
        .map(|(_, weight)| weight)
        .sum();
    round_to(total.min(1.0), 2)
}

/// Ramp-up evaluator. Uses the shared README when given one.
pub struct RampUp {
    client: Arc<dyn HostingApi>,
}

impl RampUp {
    pub fn new(client: Arc<dyn HostingApi>) -> Self {
        Self { client }
    }
}

impl MetricEvaluator for RampUp {
    fn kind(&self) -> MetricKind {
        MetricKind::RampUp
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> MetricOutcome {
        let fetched;
        let readme = match ctx.readme {
            Some(text) => text,
            None => match fetch_readme_text(self.client.as_ref(), ctx.repo, ctx.cancel) {
                Ok(text) => {
                    fetched = text.unwrap_or_default();
                    fetched.as_str()
                }
                Err(e) => {
                    tracing::warn!("{}: README unavailable for ramp-up: {e}", ctx.repo);
                    return MetricOutcome::Unknown(e.to_string());
                }
            },
        };

        if readme.trim().is_empty() {
            tracing::debug!("{}: no README, ramp-up 0", ctx.repo);
            return MetricOutcome::Scored(0.0);
        }
        MetricOutcome::Scored(ramp_up_score(readme))
    }
}
