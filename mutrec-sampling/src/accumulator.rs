//! Null Distribution Accumulators.
//!
//! Workers summarise a chunk as a sorted run-length list of scores, plus
//! the simulated hits of each region of interest summed over the chunk's
//! trials. The driver merges summaries into a fixed arena indexed by element
//! slot. Distributions are multisets and hits are sums, so merge order never
//! changes the result.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A score with a total order (`f64::total_cmp`), usable as a map key.
#[derive(Debug, Clone, Copy)]
pub struct Score(pub f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Scores of one chunk, sorted and run-length encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSummary {
    pub slot: usize,
    pub chunk: usize,
    pub counts: Vec<(Score, u32)>,
    /// Per region of the element, simulated mutations inside it over all trials
    pub region_hits: Vec<u64>,
}

impl ChunkSummary {
    pub fn from_scores(slot: usize, chunk: usize, mut scores: Vec<f64>) -> Self {
        scores.sort_unstable_by(|a, b| a.total_cmp(b));
        let mut counts: Vec<(Score, u32)> = Vec::new();
        for s in scores {
            match counts.last_mut() {
                Some((last, n)) if *last == Score(s) => *n += 1,
                _ => counts.push((Score(s), 1)),
            }
        }
        Self {
            slot,
            chunk,
            counts,
            region_hits: Vec::new(),
        }
    }

    pub fn with_region_hits(mut self, region_hits: Vec<u64>) -> Self {
        self.region_hits = region_hits;
        self
    }

    pub fn trials(&self) -> u64 {
        self.counts.iter().map(|&(_, n)| n as u64).sum()
    }
}

///
/// Histogram of simulated scores of one element.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullDistribution {
    counts: BTreeMap<Score, u64>,
    total: u64,
    region_hits: Vec<u64>,
}

impl NullDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, summary: &ChunkSummary) {
        for &(score, n) in &summary.counts {
            *self.counts.entry(score).or_insert(0) += n as u64;
            self.total += n as u64;
        }
        if self.region_hits.len() < summary.region_hits.len() {
            self.region_hits.resize(summary.region_hits.len(), 0);
        }
        for (acc, &hits) in self.region_hits.iter_mut().zip(&summary.region_hits) {
            *acc += hits;
        }
    }

    /// Number of simulated scores recorded.
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn count_at_least(&self, score: f64) -> u64 {
        self.counts.range(Score(score)..).map(|(_, &n)| n).sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let sum: f64 = self.counts.iter().map(|(s, &n)| s.0 * n as f64).sum();
        Some(sum / self.total as f64)
    }

    ///
    /// Simulated mutations inside region `idx` of the element, summed over
    /// every recorded trial.
    ///
    pub fn region_hits(&self, idx: usize) -> u64 {
        self.region_hits.get(idx).copied().unwrap_or(0)
    }

    /// Mean simulated mutations per trial inside region `idx`.
    pub fn region_mean(&self, idx: usize) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.region_hits(idx) as f64 / self.total as f64)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
        self.region_hits.clear();
    }

    /// Distinct scores with their counts, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.counts.iter().map(|(s, &n)| (s.0, n))
    }
}

///
/// One accumulator per element slot, allocated once before dispatch.
///
#[derive(Debug, Clone, Default)]
pub struct AccumulatorArena {
    slots: Vec<NullDistribution>,
}

impl AccumulatorArena {
    pub fn with_slots(n: usize) -> Self {
        Self {
            slots: vec![NullDistribution::new(); n],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn merge(&mut self, summary: &ChunkSummary) {
        if let Some(dist) = self.slots.get_mut(summary.slot) {
            dist.merge(summary);
        }
    }

    pub fn reset(&mut self, slot: usize) {
        if let Some(dist) = self.slots.get_mut(slot) {
            dist.clear();
        }
    }

    pub fn get(&self, slot: usize) -> Option<&NullDistribution> {
        self.slots.get(slot)
    }

    pub fn into_distributions(self) -> Vec<NullDistribution> {
        self.slots
    }
}
