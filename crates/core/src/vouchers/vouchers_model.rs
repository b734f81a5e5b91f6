//! Voucher domain models.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::BASE_CURRENCY;
use crate::errors::Result;
use crate::utils::numeric_utils::is_zero;
use crate::vouchers::VoucherError;

/// Journal entry category.
///
/// `General` is special on the *filter* side: a query filtering by `General`
/// matches every type except the carry types. Stored vouchers always carry a
/// concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    #[default]
    Ordinary,
    General,
    Amortization,
    AnnualCarry,
    Carry,
    Depreciation,
    Devalue,
    Uncertain,
}

impl VoucherType {
    /// Whether a stored voucher of type `self` satisfies a filter asking for
    /// `filter`. `General` collapses to "anything but a carry entry"; every
    /// other filter value requires exact equality.
    pub fn satisfies(self, filter: VoucherType) -> bool {
        match filter {
            VoucherType::General => {
                !matches!(self, VoucherType::Carry | VoucherType::AnnualCarry)
            }
            other => self == other,
        }
    }
}

/// One leg of a voucher: account title/subtitle, content tag, signed amount.
///
/// At most one detail per voucher may leave `fund` unset at construction time
/// (the balancing "plug" leg); `Voucher::balance` resolves it before the
/// voucher is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDetail {
    /// Book/owner this leg belongs to.
    pub user: String,
    /// Uppercased currency code; `BASE` means the book's base currency.
    pub currency: String,
    /// Primary chart-of-accounts code.
    pub title: i32,
    /// Secondary code. `None` means "no subtitle".
    pub sub_title: Option<i32>,
    pub content: Option<String>,
    /// Signed amount. Debit positive, credit negative.
    pub fund: Option<f64>,
    pub remark: Option<String>,
}

impl VoucherDetail {
    /// Total order used to canonicalize detail lists before persistence, so
    /// structurally-equal vouchers compare equal: (currency, title, subtitle,
    /// content, remark, fund), unset funds first.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.currency
            .cmp(&other.currency)
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.sub_title.cmp(&other.sub_title))
            .then_with(|| self.content.cmp(&other.content))
            .then_with(|| self.remark.cmp(&other.remark))
            .then_with(|| cmp_fund(self.fund, other.fund))
    }

    /// Structural comparison ignoring the fund, used to pair a stored detail
    /// with a template detail during reconciliation.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.user == other.user
            && self.currency == other.currency
            && self.title == other.title
            && self.sub_title == other.sub_title
            && self.content == other.content
            && self.remark == other.remark
    }

    /// Shape-only ordering (fund excluded), used to align detail multisets.
    pub fn shape_cmp(&self, other: &Self) -> Ordering {
        self.user
            .cmp(&other.user)
            .then_with(|| self.currency.cmp(&other.currency))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.sub_title.cmp(&other.sub_title))
            .then_with(|| self.content.cmp(&other.content))
            .then_with(|| self.remark.cmp(&other.remark))
    }
}

fn cmp_fund(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

/// A double-entry journal entry: a dated set of legs that sum to zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    /// Opaque storage id; `None` until persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `None` is a distinct "undated" category that orders before every date.
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub vtype: VoucherType,
    pub currency: String,
    pub remark: Option<String>,
    pub details: Vec<VoucherDetail>,
}

impl Voucher {
    /// Validates shape invariants that must hold before balancing.
    pub fn validate(&self) -> Result<()> {
        if self.details.is_empty() {
            return Err(VoucherError::Empty.into());
        }
        let unset = self.details.iter().filter(|d| d.fund.is_none()).count();
        if unset > 1 {
            return Err(VoucherError::MultiplePlugs.into());
        }
        Ok(())
    }

    /// Resolves the plug leg (if any) and checks that the voucher balances.
    ///
    /// With exactly one unset fund, that leg receives the negated sum of the
    /// others. With none, the existing sum must already be zero within
    /// tolerance.
    pub fn balance(&mut self) -> Result<()> {
        self.validate()?;
        let sum: f64 = self.details.iter().filter_map(|d| d.fund).sum();
        match self.details.iter_mut().find(|d| d.fund.is_none()) {
            Some(plug) => {
                plug.fund = Some(-sum);
            }
            None => {
                if !is_zero(sum) {
                    return Err(VoucherError::Unbalanced(sum).into());
                }
            }
        }
        Ok(())
    }

    /// Whether all funds are set and sum to zero within tolerance.
    pub fn is_balanced(&self) -> bool {
        if self.details.iter().any(|d| d.fund.is_none()) {
            return false;
        }
        is_zero(self.details.iter().filter_map(|d| d.fund).sum())
    }

    /// Sorts details into canonical order and uppercases currencies.
    pub fn canonicalize(&mut self) {
        self.currency = normalize_currency(&self.currency);
        for detail in &mut self.details {
            detail.currency = normalize_currency(&detail.currency);
        }
        self.details.sort_by(VoucherDetail::canonical_cmp);
    }

    /// Whether this voucher's details are, leg for leg, the same shape as the
    /// template's (funds ignored). Used by schedule registration to decide
    /// that a hand-entered voucher instantiates a template.
    pub fn matches_template(&self, template: &Voucher) -> bool {
        if self.details.len() != template.details.len() {
            return false;
        }
        let mut mine: Vec<&VoucherDetail> = self.details.iter().collect();
        let mut theirs: Vec<&VoucherDetail> = template.details.iter().collect();
        mine.sort_by(|a, b| a.shape_cmp(b));
        theirs.sort_by(|a, b| a.shape_cmp(b));
        mine.iter()
            .zip(theirs.iter())
            .all(|(a, b)| a.same_shape(b))
    }
}

/// Uppercases a currency code, defaulting empty input to the base currency.
pub fn normalize_currency(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        BASE_CURRENCY.to_string()
    } else {
        trimmed.to_uppercase()
    }
}
