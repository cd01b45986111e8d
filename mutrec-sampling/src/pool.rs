//! Worker side of the simulation pool.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};

use mutrec_background::BackgroundModel;

use crate::accumulator::ChunkSummary;
use crate::chunks::ChunkTask;
use crate::index::IndexedElement;
use crate::sampler::{ElementWeights, NullSampler};
use crate::scoring::Scorer;

pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Requested cores clamped to what the machine offers; all of them when
/// nothing is requested.
pub fn worker_count(cores: Option<usize>) -> usize {
    let available = available_cores();
    match cores {
        Some(c) => c.clamp(1, available),
        None => available,
    }
}

///
/// Whole-run cancellation flag. Cloning shares the flag.
///
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a worker sends back for each task.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub task: ChunkTask,
    pub result: Result<ChunkSummary, String>,
}

/// Read-only state shared by every worker of a run.
pub(crate) struct ChunkContext<'a> {
    pub elements: &'a [IndexedElement],
    pub weights: &'a [ElementWeights],
    pub model: &'a BackgroundModel,
    pub scorer: &'a dyn Scorer,
    pub run_seed: u64,
}

impl ChunkContext<'_> {
    pub fn run_chunk(&self, task: ChunkTask) -> Result<ChunkSummary, String> {
        let element = self
            .elements
            .get(task.slot)
            .ok_or_else(|| format!("no element in slot {}", task.slot))?;
        let weights = self
            .weights
            .get(task.slot)
            .ok_or_else(|| format!("no weights for slot {}", task.slot))?;
        let sampler = NullSampler::new(element, weights, self.model, self.run_seed);

        let mut scores = Vec::with_capacity(task.trials);
        let mut region_hits = vec![0u64; element.regions.len()];
        for trial in task.first_trial..task.first_trial + task.trials as u64 {
            let sites = sampler.draw(trial);
            let score = self.scorer.score(element, &sites);
            if !score.is_finite() {
                return Err(format!("{} scorer returned {} at trial {}", self.scorer.name(), score, trial));
            }
            scores.push(score);
            element.add_region_hits(&sites, &mut region_hits);
        }
        Ok(ChunkSummary::from_scores(task.slot, task.chunk, scores).with_region_hits(region_hits))
    }
}

///
/// Consume tasks until the queue closes. A panic inside a task is reported
/// as a failed outcome and the worker keeps going.
///
pub(crate) fn worker_loop(ctx: &ChunkContext<'_>, tasks: Receiver<ChunkTask>, results: Sender<ChunkOutcome>) {
    while let Ok(task) = tasks.recv() {
        let result = catch_unwind(AssertUnwindSafe(|| ctx.run_chunk(task)))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
        if results.send(ChunkOutcome { task, result }).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
