//! Asset domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_DISPOSAL_TITLE;
use crate::distributed::ScheduleItemCore;
use crate::errors::{Result, ValidationError};
use crate::query::{DistributedQueryAtom, MatchesAtom};
use crate::Error;

/// Depreciation method of a fixed asset.
///
/// `DoubleDecliningBalance` is recognized but not implemented; requesting it
/// fails loudly rather than silently no-opping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepreciationMethod {
    #[default]
    StraightLine,
    SumOfTheYears,
    DoubleDecliningBalance,
}

/// One event in an asset's schedule.
///
/// A closed set, exhaustively matched everywhere: acquisitions raise the book
/// value, depreciations and devaluations reduce it, a disposition zeroes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AssetScheduleItem {
    Acquisition {
        #[serde(flatten)]
        core: ScheduleItemCore,
        /// Original cost added to the book value.
        orig_value: f64,
    },
    Depreciation {
        #[serde(flatten)]
        core: ScheduleItemCore,
        amount: f64,
    },
    Devaluation {
        #[serde(flatten)]
        core: ScheduleItemCore,
        /// Fair value the book is written down to.
        fair_value: f64,
        /// Write-down actually taken; recomputed from the running book value
        /// unless the item is manually pinned.
        amount: f64,
    },
    Disposition {
        #[serde(flatten)]
        core: ScheduleItemCore,
    },
}

impl AssetScheduleItem {
    pub fn core(&self) -> &ScheduleItemCore {
        match self {
            AssetScheduleItem::Acquisition { core, .. }
            | AssetScheduleItem::Depreciation { core, .. }
            | AssetScheduleItem::Devaluation { core, .. }
            | AssetScheduleItem::Disposition { core } => core,
        }
    }

    pub fn core_mut(&mut self) -> &mut ScheduleItemCore {
        match self {
            AssetScheduleItem::Acquisition { core, .. }
            | AssetScheduleItem::Depreciation { core, .. }
            | AssetScheduleItem::Devaluation { core, .. }
            | AssetScheduleItem::Disposition { core } => core,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.core().date
    }
}

/// A fixed asset: a value recognized over its life via a schedule of
/// depreciation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub user: String,
    pub name: Option<String>,
    /// Acquisition date.
    pub date: Option<NaiveDate>,
    /// Acquisition value.
    pub value: f64,
    /// Residual value at end of life.
    pub salvage: f64,
    /// Service life in years.
    pub life: i32,
    /// Asset account.
    pub title: i32,
    /// Accumulated depreciation account.
    pub depreciation_title: i32,
    /// Accumulated devaluation account.
    pub devaluation_title: i32,
    /// Depreciation expense account.
    pub expense_title: i32,
    pub expense_sub_title: Option<i32>,
    /// Devaluation expense account.
    pub devaluation_expense_title: i32,
    pub devaluation_expense_sub_title: Option<i32>,
    /// Disposal clearing account for the 4-legged disposition voucher.
    pub disposal_title: i32,
    pub method: DepreciationMethod,
    pub remark: Option<String>,
    pub schedule: Vec<AssetScheduleItem>,
}

impl Default for Asset {
    fn default() -> Self {
        Asset {
            id: None,
            user: String::new(),
            name: None,
            date: None,
            value: 0.0,
            salvage: 0.0,
            life: 0,
            title: 0,
            depreciation_title: 0,
            devaluation_title: 0,
            expense_title: 0,
            expense_sub_title: None,
            devaluation_expense_title: 0,
            devaluation_expense_sub_title: None,
            disposal_title: DEFAULT_DISPOSAL_TITLE,
            method: DepreciationMethod::default(),
            remark: None,
            schedule: Vec::new(),
        }
    }
}

impl Asset {
    /// Validates the fields schedule generation depends on.
    pub fn validate(&self) -> Result<()> {
        if self.life < 1 {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Asset life must be at least one year".to_string(),
            )));
        }
        if !self.value.is_finite() || !self.salvage.is_finite() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Asset value and salvage must be finite".to_string(),
            )));
        }
        Ok(())
    }
}

impl MatchesAtom<DistributedQueryAtom> for Asset {
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
