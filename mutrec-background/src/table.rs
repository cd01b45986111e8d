//! Background Weight Table.
//!
//! For every position covered by an analysed interval the table stores a
//! running sum of mutability weights, so that point weights, range weights
//! and weighted position draws are all a binary search away.

use fxhash::FxHashMap;
use rayon::prelude::*;

use mutrec_core::models::GenomicInterval;

use crate::genome::ReferenceGenome;
use crate::signature::Signature;

#[derive(Debug, Clone)]
struct CoveredSegment {
    start: u32,
    end: u32,
    /// Index in `prefix` of the boundary before `start`
    offset: usize,
}

#[derive(Debug, Clone, Default)]
struct ContigWeights {
    segments: Vec<CoveredSegment>,
    /// `prefix[offset + k]` is the summed weight of the covered positions
    /// before `start + k`; segments share their boundary entries.
    prefix: Vec<f64>,
}

impl ContigWeights {
    fn build(genome: &ReferenceGenome, signature: &Signature, chr: &str, merged: &[(u32, u32)]) -> Self {
        let covered: usize = merged.iter().map(|(s, e)| (e - s) as usize).sum();
        let mut prefix = Vec::with_capacity(covered + 1);
        let mut segments = Vec::with_capacity(merged.len());
        let mut running = 0.0;
        prefix.push(running);

        for &(start, end) in merged {
            segments.push(CoveredSegment {
                start,
                end,
                offset: prefix.len() - 1,
            });
            for position in start..end {
                let weight = genome
                    .triplet(chr, position)
                    .map(|t| signature.position_weight(t))
                    .unwrap_or(0.0);
                running += weight;
                prefix.push(running);
            }
        }

        Self { segments, prefix }
    }

    fn first_segment_from(&self, position: u32) -> usize {
        self.segments.partition_point(|s| s.end <= position)
    }

    fn segment_holding(&self, start: u32, end: u32) -> Option<&CoveredSegment> {
        self.segments
            .get(self.first_segment_from(start))
            .filter(|s| s.start <= start && end <= s.end)
    }

    #[inline]
    fn boundary(&self, segment: &CoveredSegment, position: u32) -> usize {
        segment.offset + (position - segment.start) as usize
    }
}

///
/// Read-only after construction; shared by every worker of a run.
///
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    contigs: FxHashMap<String, ContigWeights>,
}

impl WeightTable {
    ///
    /// Build the table over the union of `intervals`. Intervals on contigs the
    /// genome does not hold are ignored; positions without a full ACGT
    /// context weigh 0.
    ///
    pub fn build<'a, I>(genome: &ReferenceGenome, signature: &Signature, intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a GenomicInterval>,
    {
        let mut by_contig: FxHashMap<&str, Vec<(u32, u32)>> = FxHashMap::default();
        for iv in intervals {
            if iv.is_empty() || genome.sequence(&iv.chr).is_none() {
                continue;
            }
            by_contig.entry(iv.chr.as_str()).or_default().push((iv.start, iv.end));
        }

        let contigs = by_contig
            .into_par_iter()
            .map(|(chr, mut spans)| {
                spans.sort_unstable();
                let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
                for (start, end) in spans {
                    match merged.last_mut() {
                        Some(last) if start <= last.1 => last.1 = last.1.max(end),
                        _ => merged.push((start, end)),
                    }
                }
                (chr.to_string(), ContigWeights::build(genome, signature, chr, &merged))
            })
            .collect();

        Self { contigs }
    }

    /// Number of positions the table covers.
    pub fn covered_positions(&self) -> u64 {
        self.contigs
            .values()
            .map(|c| c.prefix.len().saturating_sub(1) as u64)
            .sum()
    }

    pub fn covers(&self, chr: &str, position: u32) -> bool {
        self.position_weight(chr, position).is_some()
    }

    /// Weight of one position, `None` if the table does not cover it.
    pub fn position_weight(&self, chr: &str, position: u32) -> Option<f64> {
        let contig = self.contigs.get(chr)?;
        let segment = contig.segment_holding(position, position + 1)?;
        let i = contig.boundary(segment, position);
        Some(contig.prefix[i + 1] - contig.prefix[i])
    }

    /// Summed weight of the covered positions in `[start, end)`.
    pub fn range_weight(&self, chr: &str, start: u32, end: u32) -> f64 {
        let Some(contig) = self.contigs.get(chr) else {
            return 0.0;
        };
        let mut total = 0.0;
        for segment in &contig.segments[contig.first_segment_from(start)..] {
            if segment.start >= end {
                break;
            }
            let a = start.max(segment.start);
            let b = end.min(segment.end);
            total += contig.prefix[contig.boundary(segment, b)] - contig.prefix[contig.boundary(segment, a)];
        }
        total
    }

    ///
    /// Position inside `[start, end)` where the running weight first exceeds
    /// `target`, i.e. a weighted draw when `target` is uniform in
    /// `[0, range_weight)`. Zero-weight positions are never returned.
    ///
    /// `None` if the range is not inside one covered segment or weighs 0.
    ///
    pub fn find_position(&self, chr: &str, start: u32, end: u32, target: f64) -> Option<u32> {
        let contig = self.contigs.get(chr)?;
        let segment = contig.segment_holding(start, end)?;
        let lo = contig.boundary(segment, start);
        let hi = contig.boundary(segment, end);
        let base = contig.prefix[lo];
        let total = contig.prefix[hi] - base;
        if total <= 0.0 {
            return None;
        }

        let t = base + target.clamp(0.0, total);
        let window = &contig.prefix[lo + 1..=hi];
        let mut k = lo + 1 + window.partition_point(|&p| p <= t);
        if k > hi {
            // t reached the total through rounding: take the last weighted position
            k = (lo + 1..=hi).rev().find(|&i| contig.prefix[i] > contig.prefix[i - 1])?;
        }
        Some(segment.start + (k - 1 - segment.offset) as u32)
    }
}
