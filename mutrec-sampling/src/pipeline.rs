use std::sync::Arc;

use log::info;

use mutrec_background::{BackgroundModel, GenomeStore, ReferenceGenome, Signature};
use mutrec_core::models::{Element, MutationRecord, RegionOfInterest};
use mutrec_core::{ConfigError, RunConfig, ScoreKind};

use crate::aggregator::{ElementResult, ScoreAggregator, sort_results};
use crate::driver::ChunkedDriver;
use crate::errors::SamplingError;
use crate::index::{ElementIndex, IndexSummary};
use crate::mapping::{assign_mutations, filter_mutations};
use crate::pool::CancellationToken;
use crate::regions::{RegionAggregator, RegionResult};
use crate::scoring::{Scorer, scorer_for};
use crate::seed::resolve_run_seed;

/// Everything a run reads besides the configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub elements: Vec<Element>,
    pub mutations: Vec<MutationRecord>,
    pub regions: Vec<RegionOfInterest>,
    /// Every substitution weighs the same when absent
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Sorted: tested elements by p-value, then the others
    pub results: Vec<ElementResult>,
    /// Regions of interest under positive selection, empty without regions
    pub regions: Vec<RegionResult>,
    pub summary: IndexSummary,
    pub run_seed: u64,
    pub chunks_run: usize,
    pub failed: usize,
}

///
/// A configured analysis: load the reference, index the elements, simulate
/// and aggregate.
///
pub struct Analysis {
    config: Arc<RunConfig>,
    store: GenomeStore,
    scorer: Arc<dyn Scorer>,
    cancel: CancellationToken,
    progress: bool,
}

impl Analysis {
    pub fn new(config: RunConfig) -> Result<Self, SamplingError> {
        config.validate()?;
        let store = GenomeStore::resolve(config.genomes_dir.as_deref());
        let scorer = scorer_for(config.score);
        Ok(Self {
            config: Arc::new(config),
            store,
            scorer,
            cancel: CancellationToken::new(),
            progress: false,
        })
    }

    pub fn with_store(mut self, store: GenomeStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Token that cancels this analysis from another thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    ///
    /// Run the whole analysis. The reference genome is loaded first: if that
    /// fails the run is cancelled before any element is looked at.
    ///
    pub fn run(&self, input: AnalysisInput) -> Result<AnalysisReport, SamplingError> {
        let genome = match self.store.load(&self.config.reference_genome) {
            Ok(genome) => genome,
            Err(e) => {
                self.cancel.cancel();
                return Err(e.into());
            }
        };
        self.run_with_genome(genome, input)
    }

    pub fn run_with_genome(
        &self,
        genome: ReferenceGenome,
        input: AnalysisInput,
    ) -> Result<AnalysisReport, SamplingError> {
        if self.config.score == ScoreKind::Regions && input.regions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "score",
                reason: "`regions` scoring needs a regions of interest file".to_string(),
            }
            .into());
        }

        let with_regions = !input.regions.is_empty();
        let records = filter_mutations(input.mutations, &genome);
        let mutations = assign_mutations(records, &input.elements);
        let mut index = ElementIndex::build(input.elements, mutations, self.config.muts_min, &genome);
        index.attach_regions(&input.regions);

        let run_seed = resolve_run_seed(self.config.seed);
        let model = BackgroundModel::build(genome, input.signature.unwrap_or_default(), index.intervals());
        let summary = index.summary();
        let (elements, excluded) = index.into_parts();

        let outcome = ChunkedDriver::new(Arc::clone(&self.config), &model, self.scorer.as_ref(), run_seed)
            .with_cancellation(self.cancel.clone())
            .with_progress(self.progress)
            .run(&elements)?;

        let mut results = ScoreAggregator::new(self.scorer.as_ref(), self.config.sampling)
            .aggregate(&elements, &excluded, &outcome)?;
        sort_results(&mut results);

        let regions = if with_regions {
            RegionAggregator::new(self.config.sampling).aggregate(&elements, &outcome)?
        } else {
            Vec::new()
        };

        info!(
            "Analysed {} elements with the {} score ({} failed, {} excluded)",
            elements.len(),
            self.scorer.name(),
            outcome.failed_count(),
            excluded.len()
        );

        Ok(AnalysisReport {
            results,
            regions,
            summary,
            run_seed,
            chunks_run: outcome.chunks_run,
            failed: outcome.failed_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mutrec_core::models::GenomicInterval;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_invalid_config_is_rejected() {
        let config = RunConfig {
            sampling: 0,
            ..RunConfig::default()
        };
        assert!(matches!(Analysis::new(config), Err(SamplingError::Config(_))));
    }

    #[rstest]
    fn test_regions_score_needs_regions() {
        let config = RunConfig {
            score: ScoreKind::Regions,
            ..RunConfig::default()
        };
        let genome = ReferenceGenome::from_sequences("toy", [("1", b"ACGTACGT".to_vec())]);
        let input = AnalysisInput {
            elements: vec![Element::new("E", vec![GenomicInterval::new("1", 1, 6)])],
            ..AnalysisInput::default()
        };
        let err = Analysis::new(config).unwrap().run_with_genome(genome, input).unwrap_err();
        assert!(matches!(err, SamplingError::Config(ConfigError::InvalidValue { field: "score", .. })));
    }

    #[rstest]
    fn test_missing_reference_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            reference_genome: "nope".to_string(),
            ..RunConfig::default()
        };
        let analysis = Analysis::new(config).unwrap().with_store(GenomeStore::new(dir.path()));
        let token = analysis.cancellation_token();

        let err = analysis.run(AnalysisInput::default()).unwrap_err();
        assert!(matches!(err, SamplingError::Reference(_)));
        assert!(token.is_cancelled());
        assert_eq!(analysis.config().reference_genome, "nope");
    }
}
