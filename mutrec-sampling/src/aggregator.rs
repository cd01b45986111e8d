//! Score Aggregator: observed scores, empirical p-values and
//! Benjamini-Hochberg q-values.

use std::fmt::{self, Display};

use log::warn;
use serde::Serialize;

use crate::driver::SimulationOutcome;
use crate::errors::SamplingError;
use crate::index::{ExcludedElement, ExclusionReason, IndexedElement};
use crate::scoring::Scorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementStatus {
    Ok,
    ExcludedLowMutations,
    ExcludedMalformed,
    SimulationFailed,
    LowConfidence,
}

impl ElementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementStatus::Ok => "OK",
            ElementStatus::ExcludedLowMutations => "EXCLUDED_LOW_MUTATIONS",
            ElementStatus::ExcludedMalformed => "EXCLUDED_MALFORMED",
            ElementStatus::SimulationFailed => "SIMULATION_FAILED",
            ElementStatus::LowConfidence => "LOW_CONFIDENCE",
        }
    }

    /// Whether the element carries a p-value.
    pub fn is_tested(&self) -> bool {
        matches!(self, ElementStatus::Ok | ElementStatus::LowConfidence)
    }
}

impl Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// One row of the final table. Every element of the input annotation gets
/// one, whatever happened to it.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ElementResult {
    pub element: String,
    pub symbol: Option<String>,
    pub status: ElementStatus,
    #[serde(rename = "MUTS")]
    pub mutations: usize,
    pub observed_score: Option<f64>,
    pub mean_simulated: Option<f64>,
    pub p_value: Option<f64>,
    pub q_value: Option<f64>,
}

impl ElementResult {
    fn excluded(excluded: &ExcludedElement) -> Self {
        let status = match excluded.reason {
            ExclusionReason::LowMutations => ElementStatus::ExcludedLowMutations,
            ExclusionReason::Malformed(_) => ElementStatus::ExcludedMalformed,
        };
        Self {
            element: excluded.id.clone(),
            symbol: excluded.symbol.clone(),
            status,
            mutations: excluded.mutations,
            observed_score: None,
            mean_simulated: None,
            p_value: None,
            q_value: None,
        }
    }
}

/// `(at_least + 1) / (sampling + 1)`: never 0, at most 1.
pub fn empirical_p_value(at_least: u64, sampling: usize) -> f64 {
    (at_least as f64 + 1.0) / (sampling as f64 + 1.0)
}

///
/// Benjamini-Hochberg adjusted p-values, in the order of `p_values`.
///
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut q = vec![0.0; n];
    let mut running_min = 1.0f64;
    for (rank, &i) in order.iter().enumerate().rev() {
        let adjusted = p_values[i] * n as f64 / (rank + 1) as f64;
        running_min = running_min.min(adjusted);
        q[i] = running_min;
    }
    q
}

pub struct ScoreAggregator<'a> {
    scorer: &'a dyn Scorer,
    sampling: usize,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(scorer: &'a dyn Scorer, sampling: usize) -> Self {
        Self { scorer, sampling }
    }

    /// Score of the observed mutations, with the scorer used for the trials.
    pub fn observed_score(&self, element: &IndexedElement) -> f64 {
        self.scorer.score(element, &element.sites)
    }

    ///
    /// Build the result rows of a run: one per simulated element (addressed
    /// by position, like the driver) and one per excluded element, with
    /// q-values over the tested ones.
    ///
    /// Fails with [`SamplingError::IncompleteDistribution`] if a distribution
    /// of an element that did not fail holds other than `sampling` scores.
    ///
    pub fn aggregate(
        &self,
        elements: &[IndexedElement],
        excluded: &[ExcludedElement],
        outcome: &SimulationOutcome,
    ) -> Result<Vec<ElementResult>, SamplingError> {
        let mut results = Vec::with_capacity(elements.len() + excluded.len());

        for (slot, element) in elements.iter().enumerate() {
            let observed = self.observed_score(element);
            let mut result = ElementResult {
                element: element.id().to_string(),
                symbol: element.element.symbol.clone(),
                status: ElementStatus::SimulationFailed,
                mutations: element.mutation_count(),
                observed_score: observed.is_finite().then_some(observed),
                mean_simulated: None,
                p_value: None,
                q_value: None,
            };

            if outcome.is_failed(slot) {
                results.push(result);
                continue;
            }
            if !observed.is_finite() {
                warn!(
                    "{} scorer returned {} for the observed mutations of {}",
                    self.scorer.name(),
                    observed,
                    element.id()
                );
                results.push(result);
                continue;
            }

            let found = outcome.distribution(slot).map(|d| d.len()).unwrap_or(0);
            let distribution = match outcome.distribution(slot) {
                Some(d) if found == self.sampling as u64 => d,
                _ => {
                    return Err(SamplingError::IncompleteDistribution {
                        element: element.id().to_string(),
                        expected: self.sampling,
                        found,
                    });
                }
            };

            result.status = if outcome.is_low_confidence(slot) {
                ElementStatus::LowConfidence
            } else {
                ElementStatus::Ok
            };
            result.mean_simulated = distribution.mean();
            result.p_value = Some(empirical_p_value(distribution.count_at_least(observed), self.sampling));
            results.push(result);
        }

        results.extend(excluded.iter().map(ElementResult::excluded));

        let tested: Vec<usize> = (0..results.len()).filter(|&i| results[i].p_value.is_some()).collect();
        let p_values: Vec<f64> = tested.iter().filter_map(|&i| results[i].p_value).collect();
        for (&i, q) in tested.iter().zip(benjamini_hochberg(&p_values)) {
            results[i].q_value = Some(q);
        }

        Ok(results)
    }
}

///
/// Tested elements by p-value then identifier, the rest by identifier
/// after them.
///
pub fn sort_results(results: &mut [ElementResult]) {
    results.sort_by(|a, b| match (a.p_value, b.p_value) {
        (Some(pa), Some(pb)) => pa.total_cmp(&pb).then_with(|| a.element.cmp(&b.element)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.element.cmp(&b.element),
    });
}
