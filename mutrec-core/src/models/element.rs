use crate::errors::ElementError;
use crate::models::interval::GenomicInterval;

/// Lookup of contig lengths, implemented by anything that knows the reference
/// assembly (a loaded genome, a chrom.sizes map, ...).
pub trait ContigSizes {
    fn contig_len(&self, chr: &str) -> Option<u32>;
}

impl ContigSizes for std::collections::HashMap<String, u32> {
    fn contig_len(&self, chr: &str) -> Option<u32> {
        self.get(chr).copied()
    }
}

impl ContigSizes for fxhash::FxHashMap<String, u32> {
    fn contig_len(&self, chr: &str) -> Option<u32> {
        self.get(chr).copied()
    }
}

///
/// A genomic element (gene, regulatory region, ...) analysed as one unit.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub symbol: Option<String>,
    /// Sorted, non-overlapping once the element has been normalized
    pub intervals: Vec<GenomicInterval>,
}

impl Element {
    pub fn new(id: impl Into<String>, intervals: Vec<GenomicInterval>) -> Self {
        Self {
            id: id.into(),
            symbol: None,
            intervals,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn total_length(&self) -> u64 {
        self.intervals.iter().map(|iv| iv.width() as u64).sum()
    }

    fn malformed(&self, reason: impl Into<String>) -> ElementError {
        ElementError::MalformedInterval {
            element: self.id.clone(),
            reason: reason.into(),
        }
    }

    ///
    /// Sort the intervals and merge the ones that overlap or abut.
    ///
    /// Fails when the element has no intervals or when one of them is empty
    /// or inverted, since there is no sensible order to restore in that case.
    ///
    pub fn normalized(mut self) -> Result<Self, ElementError> {
        if self.intervals.is_empty() {
            return Err(self.malformed("element has no intervals"));
        }
        if let Some(bad) = self.intervals.iter().find(|iv| iv.is_empty()) {
            let reason = format!("empty or inverted interval {}", bad);
            return Err(self.malformed(reason));
        }

        let mut intervals = std::mem::take(&mut self.intervals);
        intervals.sort();

        let mut merged: Vec<GenomicInterval> = Vec::with_capacity(intervals.len());
        for iv in intervals {
            match merged.last_mut() {
                Some(last) if last.touches(&iv) => {
                    last.end = last.end.max(iv.end);
                }
                _ => merged.push(iv),
            }
        }

        self.intervals = merged;
        Ok(self)
    }

    ///
    /// Check every interval against the contigs of the reference assembly.
    ///
    pub fn check_contigs<C: ContigSizes + ?Sized>(&self, contigs: &C) -> Result<(), ElementError> {
        for iv in &self.intervals {
            match contigs.contig_len(&iv.chr) {
                None => {
                    let reason = format!("chromosome {} is absent from the reference", iv.chr);
                    return Err(self.malformed(reason));
                }
                Some(len) if iv.end > len => {
                    let reason = format!("interval {} extends past the chromosome end ({})", iv, len);
                    return Err(self.malformed(reason));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    ///
    /// Index of the interval holding `chr:position`, if any. Expects a
    /// normalized element.
    ///
    pub fn locate(&self, chr: &str, position: u32) -> Option<usize> {
        let idx = self.intervals.partition_point(|iv| {
            (iv.chr.as_str(), iv.end) <= (chr, position)
        });
        self.intervals
            .get(idx)
            .filter(|iv| iv.contains(chr, position))
            .map(|_| idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashMap;

    fn element(ivs: &[(&str, u32, u32)]) -> Element {
        Element::new(
            "E1",
            ivs.iter()
                .map(|(c, s, e)| GenomicInterval::new(*c, *s, *e))
                .collect(),
        )
    }

    #[rstest]
    fn test_normalize_sorts_and_merges() {
        let el = element(&[("1", 50, 60), ("1", 10, 20), ("1", 15, 30), ("1", 30, 35)])
            .normalized()
            .unwrap();
        assert_eq!(
            el.intervals,
            vec![GenomicInterval::new("1", 10, 35), GenomicInterval::new("1", 50, 60)]
        );
        assert_eq!(el.total_length(), 35);
    }

    #[rstest]
    fn test_normalize_rejects_empty() {
        let err = element(&[]).normalized().unwrap_err();
        assert!(matches!(err, ElementError::MalformedInterval { .. }));

        let err = element(&[("1", 10, 20), ("1", 30, 30)]).normalized().unwrap_err();
        assert!(err.to_string().contains("1:30-30"));

        assert!(element(&[("1", 40, 20)]).normalized().is_err());
    }

    #[rstest]
    fn test_check_contigs() {
        let sizes: HashMap<String, u32> = HashMap::from([("1".to_string(), 100)]);

        assert!(element(&[("1", 10, 100)]).check_contigs(&sizes).is_ok());
        assert!(element(&[("1", 10, 101)]).check_contigs(&sizes).is_err());
        assert!(element(&[("2", 10, 20)]).check_contigs(&sizes).is_err());
    }

    #[rstest]
    fn test_locate() {
        let el = element(&[("1", 10, 20), ("1", 40, 50), ("2", 0, 5)])
            .normalized()
            .unwrap();
        assert_eq!(el.locate("1", 10), Some(0));
        assert_eq!(el.locate("1", 19), Some(0));
        assert_eq!(el.locate("1", 20), None);
        assert_eq!(el.locate("1", 45), Some(1));
        assert_eq!(el.locate("2", 4), Some(2));
        assert_eq!(el.locate("3", 4), None);
    }
}
