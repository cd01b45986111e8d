//! Background mutability model for mutrec.
//!
//! The model answers one question for the samplers: how likely is each
//! position (and each alternate base) of an element to mutate, given its
//! trinucleotide context in the reference genome.
//!
//! - [`store`] - locating and loading reference genome datasets
//! - [`genome`] - in-memory reference sequences and mutation checks
//! - [`signature`] - per-channel substitution probabilities
//! - [`table`] - the Background Weight Table (prefix sums over analysed positions)
//! - [`model`] - [`BackgroundModel`], the read-only bundle shared by workers

pub mod context;
pub mod errors;
pub mod genome;
pub mod model;
pub mod signature;
pub mod store;
pub mod table;

// re-exports
pub use errors::{ReferenceError, SignatureError};
pub use genome::{Discard, ReferenceGenome};
pub use model::BackgroundModel;
pub use signature::Signature;
pub use store::GenomeStore;
pub use table::WeightTable;
