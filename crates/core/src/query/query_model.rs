//! Query domain models.
//!
//! A query is built once (by whatever front end parses user input) and is
//! immutable afterwards. Atoms are conjunctive sparse patterns: a field
//! participates in matching only when it is set on the filter side.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vouchers::VoucherType;

/// Generic compound query: a boolean expression tree over one atom type.
///
/// `All` is the open (null) query and matches every entity, which lets no-op
/// filters compose transparently inside the algebra.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "op", content = "args")]
pub enum Query<A> {
    #[default]
    All,
    Atom(A),
    Union(Box<Query<A>>, Box<Query<A>>),
    Intersect(Box<Query<A>>, Box<Query<A>>),
    Subtract(Box<Query<A>>, Box<Query<A>>),
    Complement(Box<Query<A>>),
}

impl<A> Query<A> {
    pub fn atom(atom: A) -> Self {
        Query::Atom(atom)
    }

    /// OR of all operands, folded into a right-leaning binary chain.
    /// An empty operand list folds to the open query.
    pub fn union(operands: Vec<Query<A>>) -> Self {
        operands
            .into_iter()
            .rev()
            .reduce(|acc, q| Query::Union(Box::new(q), Box::new(acc)))
            .unwrap_or(Query::All)
    }

    /// AND of all operands, folded into a right-leaning binary chain.
    /// An empty operand list folds to the open query.
    pub fn intersect(operands: Vec<Query<A>>) -> Self {
        operands
            .into_iter()
            .rev()
            .reduce(|acc, q| Query::Intersect(Box::new(q), Box::new(acc)))
            .unwrap_or(Query::All)
    }

    /// Matches what `keep` matches, minus what `minus` matches.
    pub fn subtract(keep: Query<A>, minus: Query<A>) -> Self {
        Query::Subtract(Box::new(keep), Box::new(minus))
    }

    pub fn complement(inner: Query<A>) -> Self {
        Query::Complement(Box::new(inner))
    }
}

/// Date-range containment filter.
///
/// An undated entity matches only when the range explicitly admits null
/// (`nullable` or `null_only`); otherwise `start <= date <= end` with either
/// bound optionally unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Whether an unset entity date is admitted.
    pub nullable: bool,
    /// Whether ONLY unset entity dates are admitted.
    pub null_only: bool,
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DateRange {
    /// The open range: every date, dated or not.
    pub fn unbounded() -> Self {
        DateRange {
            start: None,
            end: None,
            nullable: true,
            null_only: false,
        }
    }

    /// Closed range `[start, end]`; undated entities excluded.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
            nullable: false,
            null_only: false,
        }
    }

    /// `[start, +inf)`; undated entities excluded.
    pub fn since(start: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: None,
            nullable: false,
            null_only: false,
        }
    }

    /// `(-inf, end]`; undated entities included, matching the convention that
    /// undated records order before every date.
    pub fn until(end: NaiveDate) -> Self {
        DateRange {
            start: None,
            end: Some(end),
            nullable: true,
            null_only: false,
        }
    }

    /// Matches only undated entities.
    pub fn null_only() -> Self {
        DateRange {
            start: None,
            end: None,
            nullable: true,
            null_only: true,
        }
    }

    /// Range containment per the rules above.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match date {
            None => self.nullable || self.null_only,
            Some(d) => {
                if self.null_only {
                    return false;
                }
                if let Some(start) = self.start {
                    if d < start {
                        return false;
                    }
                }
                if let Some(end) = self.end {
                    if d > end {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// Debit/credit constraint on a detail's fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundDirection {
    /// Unconstrained.
    #[default]
    All,
    /// Fund must not be meaningfully negative.
    Debit,
    /// Fund must not be meaningfully positive.
    Credit,
}

/// Atomic filter over voucher details.
///
/// `sub_title: Some(0)` is special-cased to mean "no subtitle", not literal
/// zero. `content`/`remark` set to the empty string mean "must be absent on
/// the entity", distinct from `None` ("don't care").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DetailQueryAtom {
    pub user: Option<String>,
    pub currency: Option<String>,
    pub title: Option<i32>,
    pub sub_title: Option<i32>,
    pub content: Option<String>,
    pub remark: Option<String>,
    /// Matched within tolerance.
    pub fund: Option<f64>,
    pub direction: FundDirection,
}

/// Atomic filter over vouchers.
///
/// Carries an embedded detail query plus the existential/universal toggle:
/// with `for_all` unset (the default) at least one detail must match the
/// detail query; with it set, every detail must.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoucherQueryAtom {
    pub id: Option<String>,
    /// Type filter; `General` collapses per `VoucherType::satisfies`.
    #[serde(rename = "type")]
    pub vtype: Option<VoucherType>,
    pub currency: Option<String>,
    /// Empty string means "must be absent".
    pub remark: Option<String>,
    pub range: DateRange,
    pub details: Query<DetailQueryAtom>,
    pub for_all: bool,
}

/// Atomic filter over distributed entities (assets and amortizations).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DistributedQueryAtom {
    pub id: Option<Uuid>,
    pub user: Option<String>,
    /// Empty string means "must be absent".
    pub name: Option<String>,
    /// Empty string means "must be absent".
    pub remark: Option<String>,
    pub range: DateRange,
}
