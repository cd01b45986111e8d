use std::cmp::Ordering;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

///
/// One genomic interval, 0-based and half-open: `[start, end)`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct GenomicInterval {
    pub chr: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicInterval {
    pub fn new(chr: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            chr: chr.into(),
            start,
            end,
        }
    }

    ///
    /// Number of bases covered. Inverted intervals have width 0.
    ///
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, chr: &str, position: u32) -> bool {
        self.chr == chr && self.start <= position && position < self.end
    }

    pub fn overlaps(&self, other: &GenomicInterval) -> bool {
        self.chr == other.chr && self.start < other.end && other.start < self.end
    }

    /// True when the two intervals overlap or abut, i.e. can be merged into one.
    pub fn touches(&self, other: &GenomicInterval) -> bool {
        self.chr == other.chr && self.start <= other.end && other.start <= self.end
    }

    pub fn as_string(&self) -> String {
        format!("{}:{}-{}", self.chr, self.start, self.end)
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl PartialOrd for GenomicInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GenomicInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chr
            .cmp(&other.chr)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}
