//! Common schedule item fields and reset modes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::IGNORANCE_MARK;

/// Fields every schedule item carries, regardless of kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemCore {
    /// Undated items order before every dated one.
    pub date: Option<NaiveDate>,
    /// Link to the voucher realizing this item; `None` = not yet registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_id: Option<String>,
    /// Running book value after this item's effect.
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// How far a reset unwinds the links between a schedule and its vouchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResetMode {
    /// Clear links to vouchers that no longer exist.
    Soft,
    /// Clear links to missing vouchers AND delete+unlink vouchers that exist.
    Mixed,
    /// Delete every generated voucher by query. Asset-only.
    Hard,
}

/// Whether a remark carries the sentinel opting its owner out of automatic
/// reconciliation.
pub fn is_ignored(remark: Option<&str>) -> bool {
    remark == Some(IGNORANCE_MARK)
}
