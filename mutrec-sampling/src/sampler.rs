//! Null Sampler.
//!
//! Draws the `m` mutations of one simulation trial with replacement, each
//! position weighted by its background mutability and each alternate base
//! by the signature weight of its substitution channel.

use rand::Rng;
use rand::rngs::StdRng;

use mutrec_background::BackgroundModel;
use mutrec_core::models::{NUCLEOTIDES, SiteMutation};

use crate::index::IndexedElement;
use crate::seed::trial_rng;

///
/// Running interval weights of one element, prepared once before dispatch.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementWeights {
    /// `cumulative[i]` is the weight of intervals `0..=i`
    cumulative: Vec<f64>,
    /// Running widths, used by the uniform fallback
    widths: Vec<u64>,
}

impl ElementWeights {
    pub fn compute(element: &IndexedElement, model: &BackgroundModel) -> Self {
        let mut cumulative = Vec::with_capacity(element.element.intervals.len());
        let mut widths = Vec::with_capacity(element.element.intervals.len());
        let (mut weight, mut width) = (0.0, 0u64);
        for iv in &element.element.intervals {
            weight += model.interval_weight(iv);
            width += iv.width() as u64;
            cumulative.push(weight);
            widths.push(width);
        }
        Self { cumulative, widths }
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// No position of the element can mutate under the model.
    pub fn is_degenerate(&self) -> bool {
        self.total() <= 0.0
    }
}

pub struct NullSampler<'a> {
    element: &'a IndexedElement,
    weights: &'a ElementWeights,
    model: &'a BackgroundModel,
    run_seed: u64,
}

impl<'a> NullSampler<'a> {
    pub fn new(
        element: &'a IndexedElement,
        weights: &'a ElementWeights,
        model: &'a BackgroundModel,
        run_seed: u64,
    ) -> Self {
        Self {
            element,
            weights,
            model,
            run_seed,
        }
    }

    ///
    /// True when the element weighs nothing under the model and trials fall
    /// back to uniform positions.
    ///
    pub fn low_confidence(&self) -> bool {
        self.weights.is_degenerate()
    }

    ///
    /// The simulated mutation set of `trial`. The draw only depends on the
    /// run seed, the element identifier and `trial`.
    ///
    pub fn draw(&self, trial: u64) -> Vec<SiteMutation> {
        let mut rng = trial_rng(self.run_seed, self.element.key, trial);
        let m = self.element.mutation_count();
        if self.element.element.intervals.is_empty() {
            return Vec::new();
        }

        (0..m)
            .map(|_| {
                if self.low_confidence() {
                    self.draw_uniform(&mut rng)
                } else {
                    self.draw_weighted(&mut rng)
                }
            })
            .collect()
    }

    fn draw_weighted(&self, rng: &mut StdRng) -> SiteMutation {
        let total = self.weights.total();
        let target = rng.random_range(0.0..total);
        let last = self.weights.cumulative.len() - 1;
        let idx = self.weights.cumulative.partition_point(|&c| c <= target).min(last);
        let before = if idx == 0 { 0.0 } else { self.weights.cumulative[idx - 1] };

        let iv = &self.element.element.intervals[idx];
        let position = match self.model.find_position(iv, target - before) {
            Some(p) => p,
            None => iv.start + rng.random_range(0..iv.width()),
        };
        let alternate = self.draw_alternate(rng, &iv.chr, position);
        SiteMutation {
            interval: idx as u32,
            position,
            alternate,
        }
    }

    fn draw_uniform(&self, rng: &mut StdRng) -> SiteMutation {
        let span = self.weights.widths.last().copied().unwrap_or(0);
        let offset = if span == 0 { 0 } else { rng.random_range(0..span) };
        let last = self.weights.widths.len() - 1;
        let idx = self.weights.widths.partition_point(|&w| w <= offset).min(last);
        let before = if idx == 0 { 0 } else { self.weights.widths[idx - 1] };

        let iv = &self.element.element.intervals[idx];
        let position = iv.start + (offset - before) as u32;
        let alternate = uniform_alternate(rng, self.model.genome().base(&iv.chr, position));
        SiteMutation {
            interval: idx as u32,
            position,
            alternate,
        }
    }

    fn draw_alternate(&self, rng: &mut StdRng, chr: &str, position: u32) -> u8 {
        let weights = self.model.alternate_weights(chr, position);
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return uniform_alternate(rng, self.model.genome().base(chr, position));
        }
        let mut target = rng.random_range(0.0..total);
        for (base, w) in NUCLEOTIDES.iter().zip(weights) {
            if w > 0.0 {
                if target < w {
                    return *base;
                }
                target -= w;
            }
        }
        // rounding left the target past the last weighted base
        NUCLEOTIDES
            .iter()
            .zip(weights)
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(b, _)| *b)
            .unwrap_or(NUCLEOTIDES[0])
    }
}

/// Any base other than the reference one; any base at all when the
/// reference is unknown.
fn uniform_alternate(rng: &mut StdRng, reference: Option<u8>) -> u8 {
    let choices: Vec<u8> = NUCLEOTIDES
        .iter()
        .copied()
        .filter(|&b| Some(b) != reference)
        .collect();
    choices[rng.random_range(0..choices.len())]
}
