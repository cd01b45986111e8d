//! Element Index.
//!
//! Resolves every annotated element into its normalized interval list and
//! the observed mutations inside it, and keeps only the elements with at
//! least `muts_min` of them. Each kept element gets a stable slot used to
//! address its accumulator.

use fxhash::FxHashMap;
use log::{debug, info, warn};

use mutrec_core::ElementError;
use mutrec_core::models::{ContigSizes, Element, GenomicInterval, Mutation, RegionOfInterest, SiteMutation};

use crate::mapping::ElementLocator;
use crate::seed::element_key;

/// An element admitted to simulation.
#[derive(Debug, Clone)]
pub struct IndexedElement {
    pub slot: usize,
    /// Normalized: sorted, non-overlapping intervals
    pub element: Element,
    pub key: u64,
    pub mutations: Vec<Mutation>,
    /// The observed mutations, placed on the element's intervals
    pub sites: Vec<SiteMutation>,
    pub regions: Vec<RegionOfInterest>,
}

impl IndexedElement {
    pub fn id(&self) -> &str {
        &self.element.id
    }

    pub fn mutation_count(&self) -> usize {
        self.sites.len()
    }

    pub fn interval(&self, idx: u32) -> Option<&GenomicInterval> {
        self.element.intervals.get(idx as usize)
    }

    pub fn site_in(&self, site: &SiteMutation, region: &RegionOfInterest) -> bool {
        self.interval(site.interval)
            .is_some_and(|iv| region.interval.contains(&iv.chr, site.position))
    }

    /// Add the sites falling in each region of the element to `hits`, one
    /// counter per region.
    pub fn add_region_hits(&self, sites: &[SiteMutation], hits: &mut [u64]) {
        for (region, acc) in self.regions.iter().zip(hits.iter_mut()) {
            *acc += sites.iter().filter(|site| self.site_in(site, region)).count() as u64;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    LowMutations,
    Malformed(ElementError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedElement {
    pub id: String,
    pub symbol: Option<String>,
    pub mutations: usize,
    pub reason: ExclusionReason,
}

/// Counts reported alongside the results; dropping elements is never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    pub below_threshold: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ElementIndex {
    elements: Vec<IndexedElement>,
    excluded: Vec<ExcludedElement>,
}

impl ElementIndex {
    ///
    /// Build the index.
    ///
    /// Mutations are matched to elements through their `element` field.
    /// A mutation outside its element's intervals is not counted.
    ///
    pub fn build<C>(elements: Vec<Element>, mutations: Vec<Mutation>, muts_min: usize, contigs: &C) -> Self
    where
        C: ContigSizes + ?Sized,
    {
        let mut by_element: FxHashMap<String, Vec<Mutation>> = FxHashMap::default();
        for m in mutations {
            by_element.entry(m.element.clone()).or_default().push(m);
        }

        let mut index = ElementIndex::default();
        for element in elements {
            let observed = by_element.remove(&element.id).unwrap_or_default();
            let (id, symbol) = (element.id.clone(), element.symbol.clone());

            let element = match element.normalized().and_then(|e| e.check_contigs(contigs).map(|_| e)) {
                Ok(e) => e,
                Err(err) => {
                    warn!("{}", err);
                    index.excluded.push(ExcludedElement {
                        id,
                        symbol,
                        mutations: observed.len(),
                        reason: ExclusionReason::Malformed(err),
                    });
                    continue;
                }
            };

            let mut kept = Vec::with_capacity(observed.len());
            let mut sites = Vec::with_capacity(observed.len());
            for m in observed {
                match element.locate(&m.chr, m.position) {
                    Some(iv) => {
                        sites.push(SiteMutation {
                            interval: iv as u32,
                            position: m.position,
                            alternate: m.alternate,
                        });
                        kept.push(m);
                    }
                    None => debug!("{}:{} lies outside {}", m.chr, m.position + 1, element.id),
                }
            }

            if sites.len() < muts_min {
                index.excluded.push(ExcludedElement {
                    id: element.id,
                    symbol: element.symbol,
                    mutations: sites.len(),
                    reason: ExclusionReason::LowMutations,
                });
                continue;
            }

            sites.sort_unstable();
            index.elements.push(IndexedElement {
                slot: index.elements.len(),
                key: element_key(&element.id),
                element,
                mutations: kept,
                sites,
                regions: Vec::new(),
            });
        }

        if !by_element.is_empty() {
            let orphans: usize = by_element.values().map(|v| v.len()).sum();
            debug!("{} mutations name elements absent from the annotation", orphans);
        }

        let summary = index.summary();
        info!(
            "Indexed {} elements ({} below {} mutations, {} malformed)",
            summary.indexed, summary.below_threshold, muts_min, summary.malformed
        );
        index
    }

    /// Attach each region to every indexed element holding its start.
    pub fn attach_regions(&mut self, regions: &[RegionOfInterest]) {
        let locator = ElementLocator::new(self.elements.iter().map(|e| &e.element));
        let mut attached = 0usize;
        for region in regions {
            let slots = locator.find(&region.interval.chr, region.interval.start);
            if slots.is_empty() {
                debug!("Region {} ({}) maps to no indexed element", region.label(), region.interval);
            }
            for slot in slots {
                self.elements[slot].regions.push(region.clone());
                attached += 1;
            }
        }
        debug!("Attached {} of {} regions of interest", attached, regions.len());
    }

    pub fn elements(&self) -> &[IndexedElement] {
        &self.elements
    }

    pub fn excluded(&self) -> &[ExcludedElement] {
        &self.excluded
    }

    pub fn get(&self, slot: usize) -> Option<&IndexedElement> {
        self.elements.get(slot)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Every interval of every indexed element.
    pub fn intervals(&self) -> impl Iterator<Item = &GenomicInterval> {
        self.elements.iter().flat_map(|e| e.element.intervals.iter())
    }

    pub fn summary(&self) -> IndexSummary {
        let malformed = self
            .excluded
            .iter()
            .filter(|e| matches!(e.reason, ExclusionReason::Malformed(_)))
            .count();
        IndexSummary {
            indexed: self.elements.len(),
            below_threshold: self.excluded.len() - malformed,
            malformed,
        }
    }

    pub fn into_parts(self) -> (Vec<IndexedElement>, Vec<ExcludedElement>) {
        (self.elements, self.excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::*;
    use std::collections::HashMap;

    fn sizes() -> HashMap<String, u32> {
        HashMap::from([("1".to_string(), 1_000), ("2".to_string(), 500)])
    }

    fn mutation(element: &str, chr: &str, position: u32) -> Mutation {
        Mutation {
            chr: chr.to_string(),
            position,
            reference: b'A',
            alternate: b'C',
            sample: None,
            element: element.to_string(),
        }
    }

    #[rstest]
    fn test_build_filters_and_assigns_slots() {
        let elements = vec![
            Element::new("LOW", vec![GenomicInterval::new("1", 0, 100)]),
            Element::new("BAD", vec![GenomicInterval::new("9", 0, 100)]),
            Element::new("HIGH", vec![GenomicInterval::new("1", 300, 400), GenomicInterval::new("1", 200, 250)]),
            Element::new("EMPTY", vec![]),
        ];
        let mutations = vec![
            mutation("LOW", "1", 5),
            mutation("HIGH", "1", 210),
            mutation("HIGH", "1", 350),
            mutation("HIGH", "1", 350),
            // outside HIGH
            mutation("HIGH", "1", 260),
            mutation("NOPE", "1", 5),
        ];

        let index = ElementIndex::build(elements, mutations, 2, &sizes());
        assert_eq!(
            index.summary(),
            IndexSummary {
                indexed: 1,
                below_threshold: 1,
                malformed: 2
            }
        );

        let high = index.get(0).unwrap();
        assert_eq!(high.id(), "HIGH");
        assert_eq!(high.slot, 0);
        assert_eq!(high.mutation_count(), 3);
        assert_eq!(high.element.intervals[0], GenomicInterval::new("1", 200, 250));
        assert_eq!(high.sites[0].interval, 0);
        assert_eq!(high.sites[2].interval, 1);
        assert_eq!(high.key, element_key("HIGH"));

        let excluded: Vec<(&str, &ExclusionReason)> =
            index.excluded().iter().map(|e| (e.id.as_str(), &e.reason)).collect();
        assert_eq!(excluded[0], ("LOW", &ExclusionReason::LowMutations));
        assert!(matches!(excluded[1], ("BAD", ExclusionReason::Malformed(_))));
        assert!(matches!(excluded[2], ("EMPTY", ExclusionReason::Malformed(_))));
    }

    #[rstest]
    fn test_attach_regions() {
        let elements = vec![
            Element::new("A", vec![GenomicInterval::new("1", 0, 100)]),
            Element::new("B", vec![GenomicInterval::new("2", 0, 100)]),
        ];
        let mutations = vec![mutation("A", "1", 1), mutation("B", "2", 1)];
        let mut index = ElementIndex::build(elements, mutations, 1, &sizes());
        index.attach_regions(&[
            RegionOfInterest::new("R1", GenomicInterval::new("1", 10, 20)),
            RegionOfInterest::new("R2", GenomicInterval::new("2", 99, 120)),
            RegionOfInterest::new("R3", GenomicInterval::new("2", 100, 120)),
        ]);
        assert_eq!(index.get(0).unwrap().regions.len(), 1);
        assert_eq!(index.get(1).unwrap().regions[0].name, "R2");
        assert_eq!(index.get(1).unwrap().regions.len(), 1);
    }

    proptest! {
        #[test]
        fn elements_below_threshold_are_excluded(
            counts in proptest::collection::vec(0usize..8, 1..20),
            muts_min in 0usize..8,
        ) {
            let elements: Vec<Element> = (0..counts.len())
                .map(|i| Element::new(format!("E{}", i), vec![GenomicInterval::new("1", i as u32 * 10, i as u32 * 10 + 10)]))
                .collect();
            let mutations: Vec<Mutation> = counts
                .iter()
                .enumerate()
                .flat_map(|(i, &n)| (0..n).map(move |k| mutation(&format!("E{}", i), "1", i as u32 * 10 + k as u32)))
                .collect();

            let index = ElementIndex::build(elements, mutations, muts_min, &sizes());

            for e in index.elements() {
                prop_assert!(e.mutation_count() >= muts_min);
            }
            for e in index.excluded() {
                prop_assert_eq!(&e.reason, &ExclusionReason::LowMutations);
                prop_assert!(e.mutations < muts_min);
            }
            let expected = counts.iter().filter(|&&n| n >= muts_min).count();
            prop_assert_eq!(index.len(), expected);
            prop_assert_eq!(index.summary().below_threshold, counts.len() - expected);
        }
    }
}
