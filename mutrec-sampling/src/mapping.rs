//! Mutation filtering and mutation-to-element assignment.

use fxhash::FxHashMap;
use log::{debug, info, warn};

use mutrec_background::{Discard, ReferenceGenome};
use mutrec_core::models::{Element, Mutation, MutationRecord};

#[derive(Debug, Clone)]
struct ContigIntervals {
    /// `(start, end, element)` sorted by start
    intervals: Vec<(u32, u32, usize)>,
    max_width: u32,
}

///
/// Point lookup of the elements covering a position.
///
/// Intervals are sorted by start; a query binary-searches the last start
/// at or before the position and walks back while an interval of the
/// widest width could still reach it.
///
#[derive(Debug, Clone, Default)]
pub struct ElementLocator {
    contigs: FxHashMap<String, ContigIntervals>,
}

impl ElementLocator {
    pub fn new<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        let mut contigs: FxHashMap<String, ContigIntervals> = FxHashMap::default();
        for (idx, element) in elements.into_iter().enumerate() {
            for iv in element.intervals.iter().filter(|iv| !iv.is_empty()) {
                let entry = contigs.entry(iv.chr.clone()).or_insert_with(|| ContigIntervals {
                    intervals: Vec::new(),
                    max_width: 0,
                });
                entry.intervals.push((iv.start, iv.end, idx));
                entry.max_width = entry.max_width.max(iv.width());
            }
        }
        for contig in contigs.values_mut() {
            contig.intervals.sort_unstable();
        }
        Self { contigs }
    }

    /// Indices (in construction order) of the elements covering `chr:position`.
    pub fn find(&self, chr: &str, position: u32) -> Vec<usize> {
        let Some(contig) = self.contigs.get(chr) else {
            return Vec::new();
        };
        let upper = contig.intervals.partition_point(|&(start, _, _)| start <= position);
        let mut hits: Vec<usize> = contig.intervals[..upper]
            .iter()
            .rev()
            .take_while(|&&(start, _, _)| start as u64 + contig.max_width as u64 > position as u64)
            .filter(|&&(_, end, _)| position < end)
            .map(|&(_, _, idx)| idx)
            .collect();
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

///
/// Drop the calls that can't be simulated against `genome`: mitochondrial,
/// non-SNV, masked context or reference mismatch.
///
pub fn filter_mutations(records: Vec<MutationRecord>, genome: &ReferenceGenome) -> Vec<MutationRecord> {
    let total = records.len();
    let mut discarded: FxHashMap<Discard, usize> = FxHashMap::default();

    let kept: Vec<MutationRecord> = records
        .into_iter()
        .filter(|record| match genome.check_record(record) {
            Ok(()) => true,
            Err(reason) => {
                *discarded.entry(reason).or_default() += 1;
                false
            }
        })
        .collect();

    if total == 0 {
        return kept;
    }
    for (reason, count) in &discarded {
        debug!("Discarded {} mutations: {:?}", count, reason);
    }

    let pct = ((total - kept.len()) as f64 * 100.0 / total as f64 * 100.0).round() / 100.0;
    if pct < 25.0 {
        info!("Discarded {} % mutations", pct);
    } else if pct < 50.0 {
        warn!("Discarded {} % mutations", pct);
    } else {
        warn!(
            "Discarded {} % mutations. Consider revising your mutational dataset or the reference genome you are using.",
            pct
        );
    }
    kept
}

///
/// Assign every call to its element(s). A call naming its element keeps it;
/// otherwise it is mapped by position and yields one [`Mutation`] per
/// overlapping element. Calls that land in no element are dropped.
///
pub fn assign_mutations(records: Vec<MutationRecord>, elements: &[Element]) -> Vec<Mutation> {
    let locator = ElementLocator::new(elements);
    let mut mutations = Vec::with_capacity(records.len());
    let mut unmapped = 0usize;

    for record in records {
        match record.element.clone() {
            Some(element) => mutations.extend(record.into_mutation(element)),
            None => {
                let hits = locator.find(&record.chr, record.position);
                if hits.is_empty() {
                    unmapped += 1;
                }
                for idx in hits {
                    mutations.extend(record.clone().into_mutation(elements[idx].id.clone()));
                }
            }
        }
    }

    if unmapped > 0 {
        debug!("{} mutations fall outside every element", unmapped);
    }
    mutations
}

#[cfg(test)]
mod tests {
    use super::*;

    use mutrec_core::models::GenomicInterval;
    use mutrec_core::readers::{read_elements_from, read_mutations_from};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn elements() -> Vec<Element> {
        vec![
            Element::new("A", vec![GenomicInterval::new("1", 10, 20), GenomicInterval::new("1", 40, 50)]),
            Element::new("B", vec![GenomicInterval::new("1", 15, 100)]),
            Element::new("C", vec![GenomicInterval::new("2", 0, 5)]),
        ]
    }

    fn record(chr: &str, position: u32, element: Option<&str>) -> MutationRecord {
        MutationRecord {
            chr: chr.to_string(),
            position,
            reference: "A".to_string(),
            alternate: "G".to_string(),
            sample: None,
            element: element.map(|e| e.to_string()),
        }
    }

    #[rstest]
    #[case("1", 9, vec![])]
    #[case("1", 10, vec![0])]
    #[case("1", 17, vec![0, 1])]
    #[case("1", 30, vec![1])]
    #[case("1", 45, vec![0, 1])]
    #[case("1", 100, vec![])]
    #[case("2", 4, vec![2])]
    #[case("3", 4, vec![])]
    fn test_locator(#[case] chr: &str, #[case] position: u32, #[case] expected: Vec<usize>) {
        let els = elements();
        let locator = ElementLocator::new(&els);
        assert_eq!(locator.find(chr, position), expected);
    }

    #[rstest]
    fn test_assign_mutations() {
        let els = elements();
        let mutations = assign_mutations(
            vec![
                record("1", 17, None),
                record("1", 30, Some("A")),
                record("2", 99, None),
            ],
            &els,
        );
        let owners: Vec<&str> = mutations.iter().map(|m| m.element.as_str()).collect();
        assert_eq!(owners, vec!["A", "B", "A"]);
    }

    fn snv(chr: &str, position: u32, reference: &str, alternate: &str) -> MutationRecord {
        MutationRecord {
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            ..record(chr, position, None)
        }
    }

    // N at offset 4; 0-based positions
    const FILTER_SEQ: &[u8] = b"AAGANAAC";

    #[rstest]
    #[case(snv("1", 1, "A", "G"), Ok(()))]
    #[case(snv("1", 2, "G", "A"), Ok(()))]
    #[case(snv("1", 2, "A", "G"), Err(Discard::ReferenceMismatch))]
    #[case(snv("1", 3, "A", "G"), Err(Discard::MaskedContext))]
    #[case(snv("1", 7, "C", "A"), Err(Discard::MaskedContext))]
    #[case(snv("1", 1, "A", "A"), Err(Discard::NotSnv))]
    #[case(snv("1", 1, "A", "AT"), Err(Discard::NotSnv))]
    #[case(snv("M", 1, "A", "G"), Err(Discard::Mitochondrial))]
    #[case(snv("5", 1, "A", "G"), Err(Discard::UnknownContig))]
    fn test_discard_reasons(#[case] call: MutationRecord, #[case] expected: Result<(), Discard>) {
        let genome = ReferenceGenome::from_sequences("toy", [("1", FILTER_SEQ.to_vec())]);
        assert_eq!(genome.check_record(&call), expected);
    }

    #[rstest]
    fn test_filter_mutations() {
        let genome = ReferenceGenome::from_sequences("toy", [("1", FILTER_SEQ.to_vec())]);
        let kept = filter_mutations(
            vec![
                snv("1", 1, "A", "G"),
                snv("1", 2, "A", "G"),
                snv("1", 2, "G", "A"),
                snv("1", 3, "A", "G"),
                snv("1", 7, "C", "A"),
                snv("1", 1, "A", "A"),
                snv("M", 1, "A", "G"),
            ],
            &genome,
        );
        let kept: Vec<(u32, &str, &str)> = kept
            .iter()
            .map(|r| (r.position, r.reference.as_str(), r.alternate.as_str()))
            .collect();
        assert_eq!(kept, vec![(1, "A", "G"), (2, "G", "A")]);
    }

    #[rstest]
    fn test_calls_on_element_edges_are_assigned() {
        let els = read_elements_from("CHROMOSOME\tSTART\tEND\tELEMENT\n1\t100\t160\tE\n".as_bytes(), "e.tsv").unwrap();
        let calls = read_mutations_from(
            "CHROMOSOME\tPOSITION\tREF\tALT\n1\t99\tA\tG\n1\t100\tA\tG\n1\t160\tA\tG\n1\t161\tA\tG\n".as_bytes(),
            "m.tsv",
        )
        .unwrap();

        let positions: Vec<u32> = assign_mutations(calls, &els).iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![99, 159]);
    }
}
