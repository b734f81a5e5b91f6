//! Tallybook Core - Domain entities, services, and traits.
//!
//! This crate contains the core business logic of the bookkeeping engine:
//! vouchers and their canonical form, the compound query algebra with its
//! match evaluator, the recursive subtotal builder, and the distributed
//! schedule accountants (depreciation and amortization).
//!
//! It is storage-agnostic and defines traits that are implemented by the
//! `storage-memory` crate (or any other adapter).

pub mod amortizations;
pub mod assets;
pub mod constants;
pub mod distributed;
pub mod errors;
pub mod query;
pub mod subtotal;
pub mod utils;
pub mod vouchers;

// Re-export common types from the voucher and query modules
pub use query::*;
pub use vouchers::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
