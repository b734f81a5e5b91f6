//! Amortization domain models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distributed::ScheduleItemCore;
use crate::errors::{Result, ValidationError};
use crate::query::{DistributedQueryAtom, MatchesAtom};
use crate::utils::date_utils::{days_in_month, month_end, week_end, year_end};
use crate::vouchers::Voucher;
use crate::Error;

/// Recognition cadence of an amortization schedule.
///
/// The "same day" intervals anchor on the amortization's start date; when the
/// anchored day does not exist in a period (the 31st in February, Feb 29 in a
/// common year), recognition rolls to the first day of the next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmortInterval {
    #[default]
    EveryDay,
    SameDayOfWeek,
    LastDayOfWeek,
    SameDayOfMonth,
    LastDayOfMonth,
    SameDayOfYear,
    LastDayOfYear,
}

impl AmortInterval {
    /// First recognition date on or after `current`, for a schedule anchored
    /// at `anchor`.
    pub fn next_from(self, anchor: NaiveDate, current: NaiveDate) -> NaiveDate {
        match self {
            AmortInterval::EveryDay => current,
            AmortInterval::SameDayOfWeek => {
                let ahead = (7 + anchor.weekday().num_days_from_monday() as i64
                    - current.weekday().num_days_from_monday() as i64)
                    % 7;
                current + chrono::Days::new(ahead as u64)
            }
            AmortInterval::LastDayOfWeek => week_end(current),
            AmortInterval::SameDayOfMonth => {
                let day = anchor.day();
                let mut year = current.year();
                let mut month = current.month();
                loop {
                    let candidate = if day <= days_in_month(year, month) {
                        NaiveDate::from_ymd_opt(year, month, day)
                    } else {
                        // Overflowed month: roll to the 1st of the next one.
                        next_month_first(year, month)
                    };
                    if let Some(candidate) = candidate {
                        if candidate >= current {
                            return candidate;
                        }
                    }
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
            }
            AmortInterval::LastDayOfMonth => month_end(current),
            AmortInterval::SameDayOfYear => {
                let mut year = current.year();
                loop {
                    let candidate = NaiveDate::from_ymd_opt(year, anchor.month(), anchor.day())
                        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1));
                    if let Some(candidate) = candidate {
                        if candidate >= current {
                            return candidate;
                        }
                    }
                    year += 1;
                }
            }
            AmortInterval::LastDayOfYear => year_end(current),
        }
    }
}

fn next_month_first(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

/// One period of an amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AmortItem {
    #[serde(flatten)]
    pub core: ScheduleItemCore,
    /// Amount recognized in this period.
    pub amount: f64,
}

/// A value recognized over time on a fixed cadence: prepaid expenses,
/// subscriptions, deferred income.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Amortization {
    /// `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user: String,
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    /// Total value to recognize.
    pub value: f64,
    /// Length of the recognition span in days.
    pub total_days: i64,
    pub interval: AmortInterval,
    /// Voucher shape instantiated once per period; detail funds describe the
    /// split of the whole value.
    pub template: Voucher,
    pub remark: Option<String>,
    pub schedule: Vec<AmortItem>,
}

impl Amortization {
    /// Validates the fields schedule generation depends on.
    pub fn validate(&self) -> Result<()> {
        if self.total_days < 1 {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Amortization span must cover at least one day".to_string(),
            )));
        }
        if !self.value.is_finite() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Amortization value must be finite".to_string(),
            )));
        }
        if self.template.details.is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "template.details".to_string(),
            )));
        }
        Ok(())
    }
}

impl MatchesAtom<DistributedQueryAtom> for Amortization {
    fn matches_atom(&self, atom: &DistributedQueryAtom) -> bool {
        if let Some(id) = atom.id {
            if self.id != Some(id) {
                return false;
            }
        }
        if let Some(user) = &atom.user {
            if self.user != *user {
                return false;
            }
        }
        if let Some(name) = atom.name.as_deref() {
            let matches = if name.is_empty() {
                self.name.as_deref().map_or(true, str::is_empty)
            } else {
                self.name.as_deref() == Some(name)
            };
            if !matches {
                return false;
            }
        }
        if let Some(remark) = atom.remark.as_deref() {
            let matches = if remark.is_empty() {
                self.remark.as_deref().map_or(true, str::is_empty)
            } else {
                self.remark.as_deref() == Some(remark)
            };
            if !matches {
                return false;
            }
        }
        atom.range.contains(self.date)
    }
}
