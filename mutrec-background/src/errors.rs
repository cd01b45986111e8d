use std::path::PathBuf;

use thiserror::Error;

/// Failures to obtain the reference genome. Both are fatal for a run:
/// without a background model nothing can be sampled.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Reference genome `{id}` not found in {}", store.display())]
    NotFound { id: String, store: PathBuf },

    #[error("Can't load reference genome `{id}`: {reason}")]
    Load { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Invalid signature channel `{0}`, expected e.g. `ACA>T`")]
    InvalidChannel(String),

    #[error("Invalid probability {value} for channel `{channel}`")]
    InvalidProbability { channel: String, value: f64 },

    #[error("Can't parse signature file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
