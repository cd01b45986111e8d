//! Monte Carlo significance testing of mutation recurrence.
//!
//! For each element with enough observed mutations, `sampling` randomized
//! mutation sets are drawn against the background model, scored with the
//! same function as the observed set, and turned into an empirical p-value.
//!
//! - [`index`] - Element Index: normalized elements with their mutations
//! - [`sampler`] - Null Sampler: reproducible weighted draws per trial
//! - [`driver`] - Chunked Simulation Driver and its worker [`pool`]
//! - [`accumulator`] - per-element null distributions
//! - [`aggregator`] - observed scores, p-values and q-values
//! - [`regions`] - G-tests of the regions of interest inside each element
//! - [`pipeline`] - [`Analysis`], the whole run end to end
//!
//! ```no_run
//! use mutrec_core::RunConfig;
//! use mutrec_sampling::{Analysis, AnalysisInput};
//!
//! let config = RunConfig { seed: Some(1234), ..RunConfig::default() };
//! let report = Analysis::new(config)?.run(AnalysisInput::default())?;
//! for row in &report.results {
//!     println!("{}\t{}\t{:?}", row.element, row.status, row.p_value);
//! }
//! # Ok::<(), mutrec_sampling::SamplingError>(())
//! ```

pub mod accumulator;
pub mod aggregator;
pub mod chunks;
pub mod driver;
pub mod errors;
pub mod index;
pub mod mapping;
pub mod pipeline;
pub mod pool;
pub mod regions;
pub mod sampler;
pub mod scoring;
pub mod seed;

// re-exports
pub use aggregator::{ElementResult, ElementStatus, ScoreAggregator};
pub use driver::{ChunkedDriver, SimulationOutcome};
pub use errors::SamplingError;
pub use index::{ElementIndex, IndexSummary, IndexedElement};
pub use pipeline::{Analysis, AnalysisInput, AnalysisReport};
pub use pool::CancellationToken;
pub use regions::{RegionAggregator, RegionResult};
pub use sampler::NullSampler;
pub use scoring::{Scorer, scorer_for};
