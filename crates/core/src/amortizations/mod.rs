//! Amortizations module - domain models, services, and traits.

mod amortizations_model;
mod amortizations_service;
mod amortizations_traits;


// Re-export the public interface
pub use amortizations_model::{AmortInterval, AmortItem, Amortization};
pub use amortizations_service::{amortize, regularize, AmortizationService};
pub use amortizations_traits::AmortizationRepositoryTrait;
