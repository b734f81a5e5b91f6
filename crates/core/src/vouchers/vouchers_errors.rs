use thiserror::Error;

/// Errors raised while validating or balancing vouchers.
#[derive(Error, Debug)]
pub enum VoucherError {
    #[error("Voucher has no details")]
    Empty,

    #[error("Voucher does not balance: residual {0}")]
    Unbalanced(f64),

    #[error("More than one detail has an unset fund")]
    MultiplePlugs,

    #[error("Detail fund is required when persisting: title {0}")]
    MissingFund(i32),

    #[error("Voucher not found: {0}")]
    NotFound(String),
}
