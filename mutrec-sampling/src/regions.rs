//! Region-of-interest analysis.
//!
//! Mutations observed inside each region of a simulated element are compared
//! with the mean number of simulated mutations landing there, using a
//! log-likelihood G-test. Only regions under positive selection are
//! reported, with Benjamini-Hochberg q-values across them.

use log::{debug, info, warn};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::aggregator::benjamini_hochberg;
use crate::driver::SimulationOutcome;
use crate::errors::SamplingError;
use crate::index::IndexedElement;

///
/// One row of the regions table.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionResult {
    #[serde(rename = "REGION")]
    pub region: String,
    #[serde(rename = "HUGO_SYMBOL")]
    pub symbol: Option<String>,
    /// Element the region was attached to
    #[serde(skip)]
    pub element: String,
    #[serde(rename = "TOTAL_MUTS_GENE")]
    pub total_mutations: usize,
    #[serde(rename = "OBSERVED_REGION")]
    pub observed: u64,
    #[serde(rename = "MEAN_SIMULATED")]
    pub mean_simulated: f64,
    /// G statistic
    #[serde(rename = "U")]
    pub statistic: f64,
    #[serde(rename = "P_VALUE")]
    pub p_value: f64,
    #[serde(rename = "Q_VALUE")]
    pub q_value: Option<f64>,
}

///
/// Log-likelihood G statistic, `2 Σ o ln(o / e)`. Empty observed cells add
/// nothing; an observed count against an expected 0 gives infinity.
///
pub fn g_statistic(observed: &[f64], expected: &[f64]) -> f64 {
    let sum: f64 = observed
        .iter()
        .zip(expected)
        .map(|(&o, &e)| if o == 0.0 { 0.0 } else { o * (o / e).ln() })
        .sum();
    (2.0 * sum).max(0.0)
}

/// Upper tail of the chi-squared distribution with one degree of freedom.
pub fn chi_squared_sf(statistic: f64) -> f64 {
    if statistic.is_infinite() {
        return 0.0;
    }
    match ChiSquared::new(1.0) {
        Ok(dist) => dist.sf(statistic),
        Err(e) => {
            warn!("Can't build the chi-squared distribution: {}", e);
            f64::NAN
        }
    }
}

///
/// G-test of `observed` region mutations out of `total` against the mean
/// simulated count. Returns the statistic and its p-value.
///
pub fn g_test(observed: u64, total: usize, mean_simulated: f64) -> (f64, f64) {
    let (a, n) = (observed as f64, total as f64);
    let statistic = g_statistic(&[a, n - a], &[mean_simulated, n - mean_simulated]);
    (statistic, chi_squared_sf(statistic))
}

pub struct RegionAggregator {
    sampling: usize,
}

impl RegionAggregator {
    pub fn new(sampling: usize) -> Self {
        Self { sampling }
    }

    ///
    /// Test every region of every element simulated without trouble.
    /// Failed and low-confidence elements are skipped, and so are regions
    /// without observed mutations or with fewer than the simulated mean.
    ///
    /// Fails with [`SamplingError::IncompleteDistribution`] like the element
    /// aggregation does.
    ///
    pub fn aggregate(
        &self,
        elements: &[IndexedElement],
        outcome: &SimulationOutcome,
    ) -> Result<Vec<RegionResult>, SamplingError> {
        let mut results = Vec::new();

        for (slot, element) in elements.iter().enumerate() {
            if element.regions.is_empty() {
                continue;
            }
            if outcome.is_failed(slot) || outcome.is_low_confidence(slot) {
                debug!("Skipping the regions of {}", element.id());
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

            let total = element.mutation_count();
            let mut observed = vec![0u64; element.regions.len()];
            element.add_region_hits(&element.sites, &mut observed);

            for (idx, region) in element.regions.iter().enumerate() {
                let hits = observed[idx];
                if hits == 0 {
                    continue;
                }
                let mean = distribution.region_mean(idx).unwrap_or(0.0);
                // positive selection only
                if (hits as f64) < mean {
                    continue;
                }
                let (statistic, p_value) = g_test(hits, total, mean);
                results.push(RegionResult {
                    region: region.name.clone(),
                    symbol: region.symbol.clone(),
                    element: element.id().to_string(),
                    total_mutations: total,
                    observed: hits,
                    mean_simulated: mean,
                    statistic,
                    p_value,
                    q_value: None,
                });
            }
        }

        let tested: Vec<usize> = (0..results.len())
            .filter(|&i| results[i].p_value.is_finite())
            .collect();
        let p_values: Vec<f64> = tested.iter().map(|&i| results[i].p_value).collect();
        for (&i, q) in tested.iter().zip(benjamini_hochberg(&p_values)) {
            results[i].q_value = Some(q);
        }

        sort_regions(&mut results);
        if results.is_empty() {
            warn!("Empty region results: no region of interest under positive selection");
        } else {
            info!("{} regions of interest under positive selection", results.len());
        }
        Ok(results)
    }
}

/// By p-value, then region name, then element.
pub fn sort_regions(results: &mut [RegionResult]) {
    results.sort_by(|a, b| {
        a.p_value
            .total_cmp(&b.p_value)
            .then_with(|| a.region.cmp(&b.region))
            .then_with(|| a.element.cmp(&b.element))
    });
}
