//! Recursive multi-level subtotal builder.
//!
//! The dimension list is caller-specified, variable-length and variable-order
//! ("by title then by month" vs "by month then by content"), so grouping is a
//! recursive descent consuming the level list rather than a fixed-arity
//! grouping. The leaf applies one of the aggregation modes.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::subtotal::subtotal_model::{
    AggregationKind, Balance, GatherKind, SubtotalKey, SubtotalLevel, SubtotalNode, SubtotalSpec,
};
use crate::utils::date_utils::get_days_between;
use crate::utils::numeric_utils::is_zero;

/// Builds a [`SubtotalNode`] tree from pre-filtered Balance rows.
pub struct SubtotalBuilder<'a> {
    spec: &'a SubtotalSpec,
}

impl<'a> SubtotalBuilder<'a> {
    pub fn new(spec: &'a SubtotalSpec) -> Self {
        SubtotalBuilder { spec }
    }

    /// Runs the grouping recursion. The returned root is a sentinel node
    /// without a key whose fund is the grand total.
    pub fn build(&self, rows: Vec<Balance>) -> SubtotalNode {
        let mut rows = rows;
        match self.spec.gather {
            // Under ChangedDay the running total must see every contributing
            // transaction, so zero rows are kept and only displayed
            // cumulative values may end up near zero.
            GatherKind::NonZero
                if !matches!(self.spec.aggregation, AggregationKind::ChangedDay) =>
            {
                rows.retain(|row| !is_zero(row.fund));
            }
            GatherKind::Count => {
                for row in &mut rows {
                    row.fund = 1.0;
                }
            }
            _ => {}
        }
        self.build_level(rows, 0, None)
    }

    fn build_level(
        &self,
        rows: Vec<Balance>,
        depth: usize,
        key: Option<SubtotalKey>,
    ) -> SubtotalNode {
        if depth == self.spec.levels.len() {
            return self.build_leaf(rows, key);
        }
        let level = self.spec.levels[depth];
        let mut groups: BTreeMap<SubtotalKey, Vec<Balance>> = BTreeMap::new();
        for row in rows {
            groups
                .entry(group_key(level, &row))
                .or_default()
                .push(row);
        }
        let children: Vec<SubtotalNode> = groups
            .into_iter()
            .map(|(group, group_rows)| self.build_level(group_rows, depth + 1, Some(group)))
            .collect();
        let fund = children.iter().map(|child| child.fund).sum();
        SubtotalNode {
            key,
            fund,
            children,
        }
    }

    fn build_leaf(&self, rows: Vec<Balance>, key: Option<SubtotalKey>) -> SubtotalNode {
        match self.spec.aggregation {
            AggregationKind::None => {
                let fund = rows.iter().map(|row| row.fund).sum();
                SubtotalNode::leaf(key, fund)
            }
            AggregationKind::ChangedDay => self.aggregate_changed_day(rows, key),
            AggregationKind::EveryDay { start, end } => {
                self.aggregate_every_day(rows, key, start, end)
            }
        }
    }

    /// Cumulative balance series over the days that actually saw a
    /// transaction. Undated rows order first and seed the running total.
    fn aggregate_changed_day(&self, rows: Vec<Balance>, key: Option<SubtotalKey>) -> SubtotalNode {
        let mut by_day: BTreeMap<Option<NaiveDate>, f64> = BTreeMap::new();
        for row in rows {
            *by_day.entry(row.date).or_insert(0.0) += row.fund;
        }
        let mut children = Vec::with_capacity(by_day.len());
        let mut cumulative = 0.0;
        for (date, day_sum) in by_day {
            cumulative += day_sum;
            children.push(SubtotalNode::leaf(
                Some(SubtotalKey::Date(date)),
                cumulative,
            ));
        }
        SubtotalNode {
            key,
            fund: cumulative,
            children,
        }
    }

    /// Dense daily balance series over `[start, end]`, carrying the last
    /// known cumulative value into days with no transaction. Open ends
    /// default to the first/last transaction date present; transactions
    /// before the window (and undated rows) seed the opening balance.
    fn aggregate_every_day(
        &self,
        rows: Vec<Balance>,
        key: Option<SubtotalKey>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> SubtotalNode {
        let mut opening = 0.0;
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for row in &rows {
            match row.date {
                Some(date) => *by_day.entry(date).or_insert(0.0) += row.fund,
                None => opening += row.fund,
            }
        }
        let total: f64 = opening + by_day.values().sum::<f64>();

        let first = start.or_else(|| by_day.keys().next().copied());
        let last = end.or_else(|| by_day.keys().next_back().copied());
        let (Some(first), Some(last)) = (first, last) else {
            // No dated rows and no explicit bounds: nothing to synthesize.
            return SubtotalNode {
                key,
                fund: total,
                children: Vec::new(),
            };
        };

        let mut cumulative = opening;
        for (date, day_sum) in &by_day {
            if *date < first {
                cumulative += day_sum;
            }
        }
        let mut children = Vec::new();
        for day in get_days_between(first, last) {
            if let Some(day_sum) = by_day.get(&day) {
                cumulative += day_sum;
            }
            children.push(SubtotalNode::leaf(
                Some(SubtotalKey::Date(Some(day))),
                cumulative,
            ));
        }
        SubtotalNode {
            key,
            fund: total,
            children,
        }
    }
}

fn group_key(level: SubtotalLevel, row: &Balance) -> SubtotalKey {
    match level {
        SubtotalLevel::Title => SubtotalKey::Title(row.title),
        SubtotalLevel::SubTitle => SubtotalKey::SubTitle(row.sub_title),
        SubtotalLevel::Content => SubtotalKey::Content(row.content.clone()),
        SubtotalLevel::Remark => SubtotalKey::Remark(row.remark.clone()),
        SubtotalLevel::Currency => SubtotalKey::Currency(row.currency.clone()),
        SubtotalLevel::User => SubtotalKey::User(row.user.clone()),
        SubtotalLevel::Day | SubtotalLevel::Week | SubtotalLevel::Month | SubtotalLevel::Year => {
            SubtotalKey::Date(row.date.map(|d| level.bucket_date(d)))
        }
    }
}
