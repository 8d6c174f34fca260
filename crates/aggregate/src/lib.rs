//! Aggregator (§4.11): natural-language plan parsing plus decimal-precision
//! computation over the document corpus.

pub mod compute;
pub mod plan_parser;

pub use compute::aggregate;
pub use plan_parser::parse_plan;
