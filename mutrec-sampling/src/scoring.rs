//! Scoring strategies.
//!
//! The same [`Scorer`] scores the observed mutations and every simulated
//! trial of an element; a p-value is only meaningful under that symmetry.

use std::sync::Arc;

use mutrec_core::ScoreKind;
use mutrec_core::models::SiteMutation;

use crate::index::IndexedElement;

pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score one mutation set (observed or simulated) of `element`. Higher
    /// means more recurrent.
    fn score(&self, element: &IndexedElement, sites: &[SiteMutation]) -> f64;
}

/// Largest number of mutations sharing a single position.
#[derive(Debug, Clone, Copy, Default)]
pub struct HotspotScorer;

impl Scorer for HotspotScorer {
    fn name(&self) -> &'static str {
        "hotspot"
    }

    fn score(&self, _element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
        let positions = sorted_positions(sites);
        let mut best = 0usize;
        let mut run = 0usize;
        for (i, p) in positions.iter().enumerate() {
            run = if i > 0 && positions[i - 1] == *p { run + 1 } else { 1 };
            best = best.max(run);
        }
        best as f64
    }
}

/// Number of mutations landing on an already mutated position.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceScorer;

impl Scorer for RecurrenceScorer {
    fn name(&self) -> &'static str {
        "recurrence"
    }

    fn score(&self, _element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
        let mut positions = sorted_positions(sites);
        positions.dedup();
        (sites.len() - positions.len()) as f64
    }
}

/// Number of mutations inside the element's regions of interest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionScorer;

impl Scorer for RegionScorer {
    fn name(&self) -> &'static str {
        "regions"
    }

    fn score(&self, element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
        sites
            .iter()
            .filter(|site| element.regions.iter().any(|r| element.site_in(site, r)))
            .count() as f64
    }
}

pub fn scorer_for(kind: ScoreKind) -> Arc<dyn Scorer> {
    match kind {
        ScoreKind::Hotspot => Arc::new(HotspotScorer),
        ScoreKind::Recurrence => Arc::new(RecurrenceScorer),
        ScoreKind::Regions => Arc::new(RegionScorer),
    }
}

// chromosome is fixed per interval, so (interval, position) identifies a site
fn sorted_positions(sites: &[SiteMutation]) -> Vec<(u32, u32)> {
    let mut positions: Vec<(u32, u32)> = sites.iter().map(|s| (s.interval, s.position)).collect();
    positions.sort_unstable();
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    use mutrec_core::models::{Element, GenomicInterval, RegionOfInterest};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn element() -> IndexedElement {
        IndexedElement {
            slot: 0,
            element: Element::new("E", vec![GenomicInterval::new("1", 0, 100), GenomicInterval::new("2", 0, 100)]),
            key: 0,
            mutations: Vec::new(),
            sites: Vec::new(),
            regions: vec![RegionOfInterest::new("R", GenomicInterval::new("1", 10, 20))],
        }
    }

    fn site(interval: u32, position: u32, alternate: u8) -> SiteMutation {
        SiteMutation {
            interval,
            position,
            alternate,
        }
    }

    #[rstest]
    #[case(vec![], 0.0, 0.0, 0.0)]
    #[case(vec![site(0, 5, b'A')], 1.0, 0.0, 0.0)]
    #[case(vec![site(0, 15, b'A'), site(0, 15, b'C'), site(0, 16, b'A')], 2.0, 1.0, 3.0)]
    #[case(vec![site(0, 15, b'A'), site(1, 15, b'A'), site(1, 15, b'G')], 2.0, 1.0, 1.0)]
    #[case(vec![site(1, 3, b'A'), site(1, 3, b'A'), site(1, 3, b'A'), site(0, 3, b'A')], 3.0, 2.0, 0.0)]
    fn test_scorers(
        #[case] sites: Vec<SiteMutation>,
        #[case] hotspot: f64,
        #[case] recurrence: f64,
        #[case] regions: f64,
    ) {
        let el = element();
        assert_eq!(HotspotScorer.score(&el, &sites), hotspot);
        assert_eq!(RecurrenceScorer.score(&el, &sites), recurrence);
        assert_eq!(RegionScorer.score(&el, &sites), regions);
    }

    #[rstest]
    #[case(ScoreKind::Hotspot, "hotspot")]
    #[case(ScoreKind::Recurrence, "recurrence")]
    #[case(ScoreKind::Regions, "regions")]
    fn test_scorer_for(#[case] kind: ScoreKind, #[case] name: &str) {
        assert_eq!(scorer_for(kind).name(), name);
    }
}
