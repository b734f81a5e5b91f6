use thiserror::Error;

/// Errors raised by schedule generation and reconciliation.
///
/// These are configuration/programming errors: unknown or unimplemented
/// variants fail fast and are never silently defaulted. Ambiguous
/// reconciliation is NOT represented here; it is returned to callers as data
/// for manual resolution.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Depreciation method not implemented: {0}")]
    UnsupportedMethod(String),

    #[error("Hard reset is only defined for assets")]
    HardResetUnsupported,

    #[error("Schedule cannot be generated: {0}")]
    InvalidSchedule(String),

    #[error("Distributed entity not found: {0}")]
    NotFound(String),
}
