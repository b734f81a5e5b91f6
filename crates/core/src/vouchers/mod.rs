//! Vouchers module - domain models, services, and traits.

mod vouchers_errors;
mod vouchers_model;
mod vouchers_service;
mod vouchers_traits;

#[cfg(test)]
mod vouchers_model_tests;

// Re-export the public interface
pub use vouchers_errors::VoucherError;
pub use vouchers_model::{Voucher, VoucherDetail, VoucherType};
pub use vouchers_service::VoucherService;
pub use vouchers_traits::{VoucherRepositoryTrait, VoucherServiceTrait};
