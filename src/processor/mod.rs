pub mod group_canonicalizer;
pub mod header_classifier;
pub mod row_extractor;
pub mod schedule_assembler;

pub use group_canonicalizer::*;
pub use header_classifier::*;
pub use row_extractor::*;
pub use schedule_assembler::*;
