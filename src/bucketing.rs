//! Percentage bucketing.
//!
//! Identified subjects get a deterministic bucket in `0..100`, so the same
//! subject sees the same rollout decision on every evaluation. Anonymous
//! subjects draw a fresh uniform value per evaluation instead; that path takes
//! an injected [`Rng`], and the convenience wrapper uses
//! [`rand::thread_rng`], which is per-thread and independently seeded, so
//! concurrent evaluation needs no locking.

use rand::Rng;

use crate::definition::Parameters;
use crate::flags::PercentageSettings;

/// Deterministic bucket in `0..100` for an identified subject: the sum of the
/// identity's code points, modulo 100.
pub fn deterministic_bucket(identity: &str) -> u32 {
    let sum: u64 = identity.chars().map(|c| c as u64).sum();
    (sum % 100) as u32
}

/// Decide enablement for `subject` against `threshold`, drawing from `rng`
/// when the subject is anonymous.
///
/// A negative threshold always disables; logging that misconfiguration is the
/// caller's job. The boundary is strict: a subject in bucket `b` is enabled
/// iff `b < threshold`.
pub fn evaluate_with_rng(threshold: i32, subject: Option<&str>, rng: &mut impl Rng) -> bool {
    if threshold < 0 {
        return false;
    }

    match subject {
        Some(identity) if !identity.is_empty() => {
            (deterministic_bucket(identity) as i32) < threshold
        }
        // Anonymous traffic is intentionally randomized per evaluation.
        _ => rng.gen_range(0..100) < threshold,
    }
}

/// [`evaluate_with_rng`] with the per-thread generator.
pub fn evaluate(threshold: i32, subject: Option<&str>) -> bool {
    evaluate_with_rng(threshold, subject, &mut rand::thread_rng())
}

/// Percentage filter evaluator.
///
/// Holds optionally prebound settings (e.g., already resolved by an outer
/// evaluation context); when both prebound settings and a parameters blob are
/// available, the prebound settings win.
#[derive(Debug, Clone, Default)]
pub struct PercentageEvaluator {
    prebound: Option<PercentageSettings>,
}

impl PercentageEvaluator {
    pub fn new() -> PercentageEvaluator {
        PercentageEvaluator::default()
    }

    /// Bind resolved settings ahead of time.
    pub fn with_settings(settings: PercentageSettings) -> PercentageEvaluator {
        PercentageEvaluator {
            prebound: Some(settings),
        }
    }

    /// Evaluate against prebound settings, falling back to the `Value`
    /// parameter of `parameters`. An absent or unparsable value counts as 0.
    pub fn evaluate(&self, parameters: &Parameters, subject: Option<&str>) -> bool {
        self.evaluate_with_rng(parameters, subject, &mut rand::thread_rng())
    }

    /// As [`PercentageEvaluator::evaluate`], with an explicit random source.
    pub fn evaluate_with_rng(
        &self,
        parameters: &Parameters,
        subject: Option<&str>,
        rng: &mut impl Rng,
    ) -> bool {
        let threshold = match self.prebound {
            Some(settings) => settings.value.unwrap_or(0),
            None => parameters
                .get("Value")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
        };

        if threshold < 0 {
            log::warn!(target: "featuregate",
                       threshold;
                       "negative percentage threshold always disables");
        }

        evaluate_with_rng(threshold, subject, rng)
    }
}
