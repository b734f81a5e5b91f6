//! Query module - the compound query algebra and its match evaluator.

mod query_model;
mod query_matcher;


// Re-export the public interface
pub use query_matcher::{is_match, MatchesAtom};
pub use query_model::{
    DateRange, DetailQueryAtom, DistributedQueryAtom, FundDirection, Query, VoucherQueryAtom,
};
