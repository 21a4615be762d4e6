//! In-memory tables the scan reads from.

pub mod abundance;
pub mod sequence;
pub mod taxon;
pub mod taxonomy;

pub use abundance::{AbundanceMatrix, AbundanceRow, RankBy, SampleMask, SamplePattern};
pub use sequence::SequenceStore;
pub use taxon::{Taxon, TaxonSet};
pub use taxonomy::{Assignment, TaxonomyTable, NOT_ASSIGNED};
