//! Core data model for mutrec.
//!
//! mutrec estimates whether the mutations observed in a genomic element are
//! more recurrent than expected under a background mutability model, by
//! comparing an observed score against scores of randomized mutation
//! placements. This crate holds the pieces every other crate shares:
//!
//! - [`models`] - elements, intervals, mutations and regions of interest
//! - [`config`] - the immutable run configuration
//! - [`readers`] - tab-separated input tables (plain or gzip'd)
//! - [`errors`] - configuration, input and per-element error types

pub mod config;
pub mod consts;
pub mod errors;
pub mod models;
pub mod readers;
pub mod utils;

// re-exports
pub use config::{RunConfig, ScoreKind};
pub use errors::{ConfigError, ElementError, InputError};
