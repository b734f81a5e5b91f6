//! Distributed module - machinery shared by the asset and amortization
//! accountants: schedule item plumbing, reset modes, and the conservative
//! voucher/detail reconciliation rules.

mod distributed_errors;
mod distributed_model;
mod distributed_reconciler;

#[cfg(test)]
mod distributed_reconciler_tests;

// Re-export the public interface
pub use distributed_errors::ScheduleError;
pub use distributed_model::{is_ignored, ResetMode, ScheduleItemCore};
pub use distributed_reconciler::{
    bind_candidates, reconcile_voucher, scale_template, DetailUpdate, ReconcileOutcome,
};
