//! Chunked Simulation Driver.
//!
//! Every element gets `sampling` trials, split into chunk tasks. Tasks go to
//! a fixed pool of scoped worker threads over a bounded queue; summaries come
//! back on a result channel and are merged by the driver thread alone.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, unbounded};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;

use mutrec_background::BackgroundModel;
use mutrec_core::RunConfig;

use crate::accumulator::{AccumulatorArena, NullDistribution};
use crate::chunks::{ChunkPlan, ChunkTask};
use crate::errors::SamplingError;
use crate::index::IndexedElement;
use crate::pool::{CancellationToken, ChunkContext, ChunkOutcome, worker_count, worker_loop};
use crate::sampler::ElementWeights;
use crate::scoring::Scorer;

/// Null distributions of a completed run, addressed by element slot.
#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    distributions: Vec<NullDistribution>,
    failed: Vec<bool>,
    low_confidence: Vec<bool>,
    pub chunks_run: usize,
    pub retries: usize,
}

impl SimulationOutcome {
    pub(crate) fn from_parts(
        distributions: Vec<NullDistribution>,
        failed: Vec<bool>,
        low_confidence: Vec<bool>,
    ) -> Self {
        Self {
            distributions,
            failed,
            low_confidence,
            chunks_run: 0,
            retries: 0,
        }
    }

    pub fn distribution(&self, slot: usize) -> Option<&NullDistribution> {
        self.distributions.get(slot)
    }

    /// The element's chunks failed twice; its distribution is empty.
    pub fn is_failed(&self, slot: usize) -> bool {
        self.failed.get(slot).copied().unwrap_or(false)
    }

    pub fn is_low_confidence(&self, slot: usize) -> bool {
        self.low_confidence.get(slot).copied().unwrap_or(false)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.iter().filter(|&&f| f).count()
    }
}

// driver-side bookkeeping of one run
struct RunState {
    arena: AccumulatorArena,
    failed: Vec<bool>,
    retry_queue: VecDeque<ChunkTask>,
    in_flight: usize,
    dispatched: usize,
    retries: usize,
}

impl RunState {
    fn handle(&mut self, outcome: ChunkOutcome, elements: &[IndexedElement], bar: &ProgressBar) {
        let ChunkOutcome { task, result } = outcome;
        self.in_flight -= 1;

        if self.failed[task.slot] {
            bar.inc(1);
            return;
        }
        match result {
            Ok(summary) => {
                self.arena.merge(&summary);
                bar.inc(1);
            }
            Err(reason) if task.attempt == 0 => {
                warn!(
                    "Chunk {} of {} failed ({}), retrying",
                    task.chunk,
                    elements[task.slot].id(),
                    reason
                );
                self.retries += 1;
                self.retry_queue.push_back(task.retry());
            }
            Err(reason) => {
                warn!(
                    "Chunk {} of {} failed again ({}), giving up on the element",
                    task.chunk,
                    elements[task.slot].id(),
                    reason
                );
                self.failed[task.slot] = true;
                self.arena.reset(task.slot);
                bar.inc(1);
            }
        }
    }
}

pub struct ChunkedDriver<'a> {
    config: Arc<RunConfig>,
    model: &'a BackgroundModel,
    scorer: &'a dyn Scorer,
    run_seed: u64,
    cancel: CancellationToken,
    progress: bool,
}

impl<'a> ChunkedDriver<'a> {
    pub fn new(config: Arc<RunConfig>, model: &'a BackgroundModel, scorer: &'a dyn Scorer, run_seed: u64) -> Self {
        Self {
            config,
            model,
            scorer,
            run_seed,
            cancel: CancellationToken::new(),
            progress: false,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn plan(&self) -> ChunkPlan {
        ChunkPlan::new(self.config.sampling, self.config.sampling_chunk)
    }

    pub fn workers(&self) -> usize {
        worker_count(self.config.cores)
    }

    ///
    /// Simulate every element. Accumulators are addressed by position in
    /// `elements`, which is the element slot when they come from an
    /// [`ElementIndex`](crate::index::ElementIndex).
    ///
    /// Elements are dispatched most-mutated first. A failed chunk is retried
    /// once with the same seeds; a second failure marks only that element as
    /// failed. Cancellation stops dispatch, lets in-flight chunks finish and
    /// returns [`SamplingError::Cancelled`].
    ///
    pub fn run(&self, elements: &[IndexedElement]) -> Result<SimulationOutcome, SamplingError> {
        let plan = self.plan();
        let workers = self.workers();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SamplingError::WorkerPool(e.to_string()))?;
        let weights: Vec<ElementWeights> = pool.install(|| {
            elements
                .par_iter()
                .map(|e| ElementWeights::compute(e, self.model))
                .collect()
        });

        let low_confidence: Vec<bool> = weights.iter().map(|w| w.is_degenerate()).collect();
        for (element, _) in elements.iter().zip(&low_confidence).filter(|(_, low)| **low) {
            warn!(
                "{} has no mutable position under the background model, sampling uniformly",
                element.id()
            );
        }

        let total_tasks = elements.len() * plan.num_chunks();
        info!(
            "Simulating {} elements: {} trials each in {} chunks of {} on {} workers",
            elements.len(),
            plan.sampling(),
            plan.num_chunks(),
            plan.chunk_size(),
            workers
        );

        let mut order: Vec<usize> = (0..elements.len()).collect();
        order.sort_by_key(|&slot| std::cmp::Reverse(elements[slot].mutation_count()));
        let mut pending = order.into_iter().flat_map(move |slot| {
            plan.chunks().map(move |(chunk, first_trial, trials)| ChunkTask {
                slot,
                chunk,
                first_trial,
                trials,
                attempt: 0,
            })
        });

        let bar = if self.progress {
            ProgressBar::new(total_tasks as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} chunks")
        {
            bar.set_style(style);
        }

        let mut state = RunState {
            arena: AccumulatorArena::with_slots(elements.len()),
            failed: vec![false; elements.len()],
            retry_queue: VecDeque::new(),
            in_flight: 0,
            dispatched: 0,
            retries: 0,
        };

        if total_tasks > 0 {
            let ctx = ChunkContext {
                elements,
                weights: &weights,
                model: self.model,
                scorer: self.scorer,
                run_seed: self.run_seed,
            };

            thread::scope(|scope| -> Result<(), SamplingError> {
                let (task_tx, task_rx) = bounded::<ChunkTask>(workers * 2);
                let (result_tx, result_rx) = unbounded::<ChunkOutcome>();

                for i in 0..workers {
                    let (tasks, results, ctx) = (task_rx.clone(), result_tx.clone(), &ctx);
                    thread::Builder::new()
                        .name(format!("mutrec-worker-{}", i))
                        .spawn_scoped(scope, move || worker_loop(ctx, tasks, results))
                        .map_err(|e| SamplingError::WorkerPool(e.to_string()))?;
                }
                drop(task_rx);
                drop(result_tx);

                let lost = || SamplingError::WorkerPool("worker threads exited early".to_string());
                let mut next: Option<ChunkTask> = None;

                loop {
                    if self.cancel.is_cancelled() {
                        next = None;
                    } else if next.is_none() {
                        next = match state.retry_queue.pop_front() {
                            Some(task) => Some(task),
                            None => pending.by_ref().find(|t| !state.failed[t.slot]),
                        };
                    }

                    match next {
                        Some(task) => select! {
                            send(task_tx, task) -> res => {
                                res.map_err(|_| lost())?;
                                state.in_flight += 1;
                                state.dispatched += 1;
                                next = None;
                            }
                            recv(result_rx) -> msg => {
                                state.handle(msg.map_err(|_| lost())?, elements, &bar);
                            }
                        },
                        None if state.in_flight > 0 => {
                            let outcome = result_rx.recv().map_err(|_| lost())?;
                            state.handle(outcome, elements, &bar);
                        }
                        None => break,
                    }
                }
                // closing the queue lets the workers return
                drop(task_tx);
                Ok(())
            })?;
        }
        bar.finish_and_clear();

        if self.cancel.is_cancelled() {
            warn!("Run cancelled after {} chunk tasks", state.dispatched);
            return Err(SamplingError::Cancelled {
                dispatched: state.dispatched,
            });
        }

        debug!(
            "Ran {} chunk tasks ({} retries) for {} elements",
            state.dispatched,
            state.retries,
            elements.len()
        );

        Ok(SimulationOutcome {
            distributions: state.arena.into_distributions(),
            failed: state.failed,
            low_confidence,
            chunks_run: state.dispatched,
            retries: state.retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use mutrec_background::{ReferenceGenome, Signature};
    use mutrec_core::models::{Element, GenomicInterval, Mutation, SiteMutation};
    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::index::ElementIndex;
    use crate::scoring::HotspotScorer;

    const SEQ: &[u8] = b"ACGTACGTTGCAACGTACGTTTGACCAGTACGATCGATCGGCTAGCTAGCATGCAGGTACCAT";

    fn setup(elements: &[(&str, u32, u32, usize)]) -> (Vec<IndexedElement>, BackgroundModel) {
        let genome = ReferenceGenome::from_sequences("toy", [("1", SEQ.to_vec())]);
        let mut annotation = Vec::new();
        let mut mutations = Vec::new();
        for &(id, start, end, muts) in elements {
            annotation.push(Element::new(id, vec![GenomicInterval::new("1", start, end)]));
            for k in 0..muts {
                mutations.push(Mutation {
                    chr: "1".to_string(),
                    position: start + 1 + (k as u32 % 2),
                    reference: b'A',
                    alternate: b'C',
                    sample: None,
                    element: id.to_string(),
                });
            }
        }
        let index = ElementIndex::build(annotation, mutations, 1, &genome);
        let model = BackgroundModel::build(genome, Signature::uniform(), index.intervals());
        (index.into_parts().0, model)
    }

    fn config(sampling: usize, sampling_chunk: usize, cores: usize) -> Arc<RunConfig> {
        Arc::new(RunConfig {
            sampling,
            sampling_chunk,
            cores: Some(cores),
            seed: Some(1),
            ..RunConfig::default()
        })
    }

    #[rstest]
    #[case(1000, 100, 10)]
    #[case(950, 100, 10)]
    #[case(40, 1000, 1)]
    fn test_every_element_gets_exactly_sampling(
        #[case] sampling: usize,
        #[case] chunk: usize,
        #[case] expected_chunks: usize,
    ) {
        let (elements, model) = setup(&[("A", 1, 20, 3), ("B", 25, 50, 5)]);
        let driver = ChunkedDriver::new(config(sampling, chunk, 3), &model, &HotspotScorer, 1);
        let outcome = driver.run(&elements).unwrap();

        assert_eq!(outcome.chunks_run, 2 * expected_chunks);
        for slot in 0..elements.len() {
            assert_eq!(outcome.distribution(slot).unwrap().len(), sampling as u64);
            assert!(!outcome.is_failed(slot));
        }
    }

    #[rstest]
    fn test_results_do_not_depend_on_worker_count() {
        let (elements, model) = setup(&[("A", 1, 20, 3), ("B", 25, 50, 5)]);
        let one = ChunkedDriver::new(config(300, 7, 1), &model, &HotspotScorer, 42)
            .run(&elements)
            .unwrap();
        let many = ChunkedDriver::new(config(300, 50, 4), &model, &HotspotScorer, 42)
            .run(&elements)
            .unwrap();
        for slot in 0..elements.len() {
            assert_eq!(one.distribution(slot), many.distribution(slot));
        }
    }

    // panics on the first call for element B, then behaves
    struct FlakyScorer {
        calls: AtomicUsize,
    }

    impl Scorer for FlakyScorer {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn score(&self, element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
            if element.id() == "B" && self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("transient failure");
            }
            HotspotScorer.score(element, sites)
        }
    }

    struct BrokenScorer;

    impl Scorer for BrokenScorer {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn score(&self, element: &IndexedElement, sites: &[SiteMutation]) -> f64 {
            if element.id() == "B" {
                return f64::NAN;
            }
            HotspotScorer.score(element, sites)
        }
    }

    #[rstest]
    fn test_failed_chunk_is_retried_once() {
        let (elements, model) = setup(&[("A", 1, 20, 3), ("B", 25, 50, 5)]);
        let scorer = FlakyScorer {
            calls: AtomicUsize::new(0),
        };
        let outcome = ChunkedDriver::new(config(200, 50, 2), &model, &scorer, 3)
            .run(&elements)
            .unwrap();

        assert_eq!(outcome.retries, 1);
        assert_eq!(outcome.failed_count(), 0);
        assert_eq!(outcome.distribution(1).unwrap().len(), 200);

        let clean = ChunkedDriver::new(config(200, 50, 2), &model, &HotspotScorer, 3)
            .run(&elements)
            .unwrap();
        assert_eq!(outcome.distribution(1), clean.distribution(1));
    }

    #[rstest]
    fn test_second_failure_only_fails_that_element() {
        let (elements, model) = setup(&[("A", 1, 20, 3), ("B", 25, 50, 5)]);
        let outcome = ChunkedDriver::new(config(200, 50, 2), &model, &BrokenScorer, 3)
            .run(&elements)
            .unwrap();

        let b = elements.iter().position(|e| e.id() == "B").unwrap();
        let a = 1 - b;
        assert!(outcome.is_failed(b));
        assert!(outcome.distribution(b).unwrap().is_empty());
        assert!(!outcome.is_failed(a));
        assert_eq!(outcome.distribution(a).unwrap().len(), 200);
    }

    #[rstest]
    fn test_cancelled_run_dispatches_nothing() {
        let (elements, model) = setup(&[("A", 1, 20, 3)]);
        let token = CancellationToken::new();
        token.cancel();
        let err = ChunkedDriver::new(config(200, 50, 2), &model, &HotspotScorer, 3)
            .with_cancellation(token)
            .run(&elements)
            .unwrap_err();
        assert!(matches!(err, SamplingError::Cancelled { dispatched: 0 }));
    }

    #[rstest]
    fn test_no_elements() {
        let (_, model) = setup(&[("A", 1, 20, 3)]);
        let outcome = ChunkedDriver::new(config(200, 50, 2), &model, &HotspotScorer, 3)
            .run(&[])
            .unwrap();
        assert_eq!(outcome.chunks_run, 0);
    }
}
