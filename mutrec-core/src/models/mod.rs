pub mod element;
pub mod interval;
pub mod mutation;
pub mod region;

// re-export for cleaner imports
pub use self::element::{ContigSizes, Element};
pub use self::interval::GenomicInterval;
pub use self::mutation::{Mutation, MutationRecord, SiteMutation, NUCLEOTIDES};
pub use self::region::RegionOfInterest;
