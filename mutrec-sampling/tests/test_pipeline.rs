use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::*;

use mutrec_background::{GenomeStore, ReferenceError, ReferenceGenome, Signature};
use mutrec_core::models::{Element, GenomicInterval, MutationRecord, SiteMutation};
use mutrec_core::readers::{read_elements, read_mutations, read_regions};
use mutrec_core::{RunConfig, ScoreKind};
use mutrec_sampling::scoring::HotspotScorer;
use mutrec_sampling::{
    Analysis, AnalysisInput, AnalysisReport, ElementResult, ElementStatus, IndexedElement, SamplingError, Scorer,
};

#[fixture]
fn path_to_data() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/data")
}

fn input(data: &Path, with_regions: bool, with_signature: bool) -> AnalysisInput {
    AnalysisInput {
        elements: read_elements(&data.join("elements.tsv")).unwrap(),
        mutations: read_mutations(&data.join("mutations.tsv")).unwrap(),
        regions: if with_regions {
            read_regions(&data.join("regions.tsv")).unwrap()
        } else {
            Vec::new()
        },
        signature: with_signature.then(|| Signature::load(&data.join("signature.json")).unwrap()),
    }
}

fn scenario_config() -> RunConfig {
    RunConfig {
        reference_genome: "toy".to_string(),
        muts_min: 3,
        sampling: 1000,
        sampling_chunk: 100,
        seed: Some(1234),
        cores: Some(4),
        ..RunConfig::default()
    }
}

fn run(data: &Path, config: RunConfig, with_regions: bool, with_signature: bool) -> AnalysisReport {
    Analysis::new(config)
        .unwrap()
        .with_store(GenomeStore::new(data.join("genomes")))
        .run(input(data, with_regions, with_signature))
        .unwrap()
}

fn row<'a>(report: &'a AnalysisReport, id: &str) -> &'a ElementResult {
    report.results.iter().find(|r| r.element == id).unwrap()
}

#[rstest]
fn test_end_to_end_is_reproducible(path_to_data: PathBuf) {
    let first = run(&path_to_data, scenario_config(), false, false);
    let second = run(&path_to_data, scenario_config(), false, false);

    let gene1 = row(&first, "ENSG0001");
    assert_eq!(gene1.status, ElementStatus::Ok);
    assert_eq!(gene1.symbol.as_deref(), Some("GENE1"));
    assert_eq!(gene1.mutations, 5);
    assert_eq!(gene1.observed_score, Some(3.0));

    let p = gene1.p_value.unwrap();
    assert!(p >= 1.0 / 1001.0 && p <= 1.0);
    assert_eq!(first.results, second.results);
    assert_eq!(first.run_seed, 1234);
}

#[rstest]
fn test_every_element_gets_a_status(path_to_data: PathBuf) {
    let report = run(&path_to_data, scenario_config(), false, false);

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.summary.indexed, 2);
    assert_eq!(report.summary.below_threshold, 1);
    assert_eq!(report.summary.malformed, 1);
    // 2 elements x 10 chunks
    assert_eq!(report.chunks_run, 20);

    assert_eq!(row(&report, "ENSG0002").status, ElementStatus::Ok);
    // three distinct positions: every trial scores at least 1
    assert_eq!(row(&report, "ENSG0002").p_value, Some(1.0));
    assert_eq!(row(&report, "ENSG0003").status, ElementStatus::ExcludedLowMutations);
    assert_eq!(row(&report, "ENSG0003").mutations, 1);
    assert_eq!(row(&report, "ENSG0004").status, ElementStatus::ExcludedMalformed);
    assert_eq!(row(&report, "ENSG0004").q_value, None);

    // tested rows first
    let statuses: Vec<bool> = report.results.iter().map(|r| r.status.is_tested()).collect();
    assert_eq!(statuses, vec![true, true, false, false]);
}

#[rstest]
fn test_chunking_does_not_change_results(path_to_data: PathBuf) {
    let coarse = run(&path_to_data, scenario_config(), false, false);
    let fine = run(
        &path_to_data,
        RunConfig {
            sampling_chunk: 37,
            cores: Some(1),
            ..scenario_config()
        },
        false,
        false,
    );
    assert_eq!(coarse.results, fine.results);
}

#[rstest]
fn test_regions_score(path_to_data: PathBuf) {
    let config = RunConfig {
        score: ScoreKind::Regions,
        ..scenario_config()
    };
    let report = run(&path_to_data, config, true, false);
    // the three recurrent mutations of GENE1 sit in DOMAIN1
    assert_eq!(row(&report, "ENSG0001").observed_score, Some(3.0));
    assert_eq!(row(&report, "ENSG0002").observed_score, Some(1.0));
}

#[rstest]
fn test_region_analysis(path_to_data: PathBuf) {
    let report = run(&path_to_data, scenario_config(), true, false);

    let domain1 = report.regions.iter().find(|r| r.region == "DOMAIN1").unwrap();
    assert_eq!(domain1.symbol.as_deref(), Some("GENE1"));
    assert_eq!(domain1.element, "ENSG0001");
    assert_eq!(domain1.total_mutations, 5);
    assert_eq!(domain1.observed, 3);
    // 10 of the 100 bases of GENE1, uniform weights
    assert!(domain1.mean_simulated > 0.3 && domain1.mean_simulated < 0.7);
    assert!(domain1.p_value < 0.05);
    assert!(domain1.q_value.unwrap() >= domain1.p_value);

    for r in &report.regions {
        assert!(r.observed as f64 >= r.mean_simulated);
    }
    let p_values: Vec<f64> = report.regions.iter().map(|r| r.p_value).collect();
    assert!(p_values.windows(2).all(|w| w[0] <= w[1]));

    let again = run(&path_to_data, scenario_config(), true, false);
    assert_eq!(report.regions, again.regions);
    assert!(run(&path_to_data, scenario_config(), false, false).regions.is_empty());
}

#[rstest]
fn test_with_signature(path_to_data: PathBuf) {
    let report = run(&path_to_data, scenario_config(), false, true);
    for r in report.results.iter().filter(|r| r.status.is_tested()) {
        let p = r.p_value.unwrap();
        assert!(p > 0.0 && p <= 1.0);
        assert!(r.q_value.unwrap() >= p);
    }
}

struct CountingScorer {
    calls: AtomicUsize,
}

impl Scorer for CountingScorer {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn score(&self, element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HotspotScorer.score(element, sites)
    }
}

#[rstest]
fn test_unknown_reference_aborts_before_simulation(path_to_data: PathBuf) {
    let scorer = Arc::new(CountingScorer {
        calls: AtomicUsize::new(0),
    });
    let config = RunConfig {
        reference_genome: "hg00".to_string(),
        ..scenario_config()
    };
    let analysis = Analysis::new(config)
        .unwrap()
        .with_store(GenomeStore::new(path_to_data.join("genomes")))
        .with_scorer(scorer.clone());

    let err = analysis.run(input(&path_to_data, false, false)).unwrap_err();
    assert!(matches!(
        err,
        SamplingError::Reference(ReferenceError::NotFound { ref id, .. }) if id == "hg00"
    ));
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
fn test_cancelled_before_dispatch(path_to_data: PathBuf) {
    let analysis = Analysis::new(scenario_config())
        .unwrap()
        .with_store(GenomeStore::new(path_to_data.join("genomes")));
    analysis.cancellation_token().cancel();

    let err = analysis.run(input(&path_to_data, false, false)).unwrap_err();
    assert!(matches!(err, SamplingError::Cancelled { dispatched: 0 }));
}

#[rstest]
fn test_unmutable_element_is_low_confidence() {
    // TTT contexts weigh nothing under a signature that only knows ACA>G
    let genome = ReferenceGenome::from_sequences("flat", [("1", b"TTTTTTTTTTTTTTTTTTTT".to_vec())]);
    let signature = Signature::from_channels(&HashMap::from([("ACA>G".to_string(), 1.0)])).unwrap();
    let mutation = |position: u32| MutationRecord {
        chr: "1".to_string(),
        position,
        reference: "T".to_string(),
        alternate: "C".to_string(),
        sample: None,
        element: None,
    };
    let input = AnalysisInput {
        elements: vec![Element::new("FLAT", vec![GenomicInterval::new("1", 2, 18)])],
        mutations: vec![mutation(5), mutation(5), mutation(9)],
        regions: Vec::new(),
        signature: Some(signature),
    };
    let config = RunConfig {
        reference_genome: "flat".to_string(),
        muts_min: 2,
        sampling: 200,
        sampling_chunk: 50,
        seed: Some(9),
        cores: Some(2),
        ..RunConfig::default()
    };

    let report = Analysis::new(config).unwrap().run_with_genome(genome, input).unwrap();
    let flat = row(&report, "FLAT");
    assert_eq!(flat.status, ElementStatus::LowConfidence);
    assert_eq!(flat.observed_score, Some(2.0));
    assert!(flat.p_value.is_some());
}
