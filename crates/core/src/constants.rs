/// Epsilon below which a monetary amount is treated as zero.
///
/// Every near-zero / near-equal decision in the engine goes through the
/// helpers in `utils::numeric_utils`, which read this single constant.
pub const TOLERANCE: f64 = 1e-8;

/// Currency code meaning "the book's base currency".
pub const BASE_CURRENCY: &str = "BASE";

/// Default account title for the disposal clearing leg of a disposition voucher.
pub const DEFAULT_DISPOSAL_TITLE: i32 = 1606;

/// Sentinel remark opting an entity or schedule item out of automatic
/// reconciliation ("manually managed").
pub const IGNORANCE_MARK: &str = "manual";
