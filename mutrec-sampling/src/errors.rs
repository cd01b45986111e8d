use thiserror::Error;

use mutrec_background::ReferenceError;
use mutrec_core::ConfigError;

/// Errors fatal to a whole run. Per-element problems are reported through
/// the element status instead.
#[derive(Error, Debug)]
pub enum SamplingError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Incomplete null distribution for {element}: expected {expected} trials, found {found}")]
    IncompleteDistribution {
        element: String,
        expected: usize,
        found: u64,
    },

    #[error("Run cancelled after dispatching {dispatched} chunk tasks")]
    Cancelled { dispatched: usize },

    #[error("Worker pool failure: {0}")]
    WorkerPool(String),
}
