//! Subtotal module - multi-level grouping and aggregation over voucher details.

mod subtotal_builder;
mod subtotal_model;

#[cfg(test)]
mod subtotal_builder_tests;

// Re-export the public interface
pub use subtotal_builder::SubtotalBuilder;
pub use subtotal_model::{
    flatten_rows, AggregationKind, Balance, GatherKind, SubtotalKey, SubtotalLevel, SubtotalNode,
    SubtotalSpec,
};
