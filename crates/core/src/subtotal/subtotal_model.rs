//! Subtotal domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::{is_match, DetailQueryAtom, Query};
use crate::utils::date_utils::{month_start, week_start, year_start};
use crate::vouchers::Voucher;

/// One flattened (voucher × detail) row, the input shape of the subtotal
/// builder. Also the output shape of a storage adapter that pushes grouping
/// down to its backend, in which case only the grouped dimensions are
/// populated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub date: Option<NaiveDate>,
    pub title: Option<i32>,
    pub sub_title: Option<i32>,
    pub content: Option<String>,
    pub remark: Option<String>,
    pub currency: Option<String>,
    pub user: Option<String>,
    /// Book value column for schedule flattening; unused for plain vouchers.
    pub value: Option<f64>,
    pub fund: f64,
}

/// One grouping dimension of a subtotal.
///
/// The four date levels pick a bucketing function of increasing coarseness;
/// a level list uses at most one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubtotalLevel {
    Title,
    SubTitle,
    Content,
    Remark,
    Currency,
    User,
    Day,
    Week,
    Month,
    Year,
}

impl SubtotalLevel {
    /// Projects a date onto its bucket start for the date levels; identity
    /// for `Day`.
    pub fn bucket_date(self, date: NaiveDate) -> NaiveDate {
        match self {
            SubtotalLevel::Week => week_start(date),
            SubtotalLevel::Month => month_start(date),
            SubtotalLevel::Year => year_start(date),
            _ => date,
        }
    }
}

/// Aggregation semantics applied at the deepest level of a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AggregationKind {
    /// Plain sum.
    #[default]
    None,
    /// Cumulative running balance, one entry per day that saw a transaction.
    ChangedDay,
    /// Cumulative running balance, one entry per calendar day; days without
    /// transactions carry the last balance forward. Open ends default to the
    /// first/last transaction date present.
    EveryDay {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// Row gathering policy applied before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatherKind {
    /// Keep every row.
    #[default]
    All,
    /// Drop rows whose fund is zero within tolerance. Exempted under
    /// `ChangedDay` aggregation, where the running total must see every
    /// contributing transaction.
    NonZero,
    /// Count rows instead of summing funds.
    Count,
}

/// Ordered grouping levels plus leaf aggregation and gathering policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubtotalSpec {
    pub levels: Vec<SubtotalLevel>,
    pub aggregation: AggregationKind,
    pub gather: GatherKind,
}

/// Group key of one subtotal node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubtotalKey {
    Title(Option<i32>),
    SubTitle(Option<i32>),
    Content(Option<String>),
    Remark(Option<String>),
    Currency(Option<String>),
    User(Option<String>),
    Date(Option<NaiveDate>),
}

/// One node of the subtotal result tree. The root is a sentinel without a
/// key whose fund is the grand total.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubtotalNode {
    pub key: Option<SubtotalKey>,
    pub fund: f64,
    pub children: Vec<SubtotalNode>,
}

impl SubtotalNode {
    pub fn leaf(key: Option<SubtotalKey>, fund: f64) -> Self {
        SubtotalNode {
            key,
            fund,
            children: Vec::new(),
        }
    }
}

/// Flattens vouchers into Balance rows, keeping only details that match the
/// detail query and carry a fund.
pub fn flatten_rows(vouchers: &[Voucher], detail_query: &Query<DetailQueryAtom>) -> Vec<Balance> {
    let mut rows = Vec::new();
    for voucher in vouchers {
        for detail in &voucher.details {
            let Some(fund) = detail.fund else { continue };
            if !is_match(detail, detail_query) {
                continue;
            }
            rows.push(Balance {
                date: voucher.date,
                title: Some(detail.title),
                sub_title: detail.sub_title,
                content: detail.content.clone(),
                remark: detail.remark.clone(),
                currency: Some(detail.currency.clone()),
                user: Some(detail.user.clone()),
                value: None,
                fund,
            });
        }
    }
    rows
}
