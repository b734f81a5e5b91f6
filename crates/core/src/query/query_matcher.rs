//! Match evaluator: membership of an entity in a compound query.
//!
//! The boolean algebra is implemented once, generically over the atom type;
//! entity kinds only supply their atomic predicate via [`MatchesAtom`].
//! Atomic predicates are pure, so short-circuit evaluation is safe.

use crate::query::query_model::{DetailQueryAtom, FundDirection, Query, VoucherQueryAtom};
use crate::utils::numeric_utils::{is_equal, is_non_negative, is_non_positive};
use crate::vouchers::{Voucher, VoucherDetail};

/// Atomic predicate an entity kind supplies to the generic evaluator.
pub trait MatchesAtom<A> {
    fn matches_atom(&self, atom: &A) -> bool;
}

/// Whether `entity` is a member of the set described by `query`.
pub fn is_match<A, E: MatchesAtom<A>>(entity: &E, query: &Query<A>) -> bool {
    match query {
        Query::All => true,
        Query::Atom(atom) => entity.matches_atom(atom),
        Query::Union(lhs, rhs) => is_match(entity, lhs) || is_match(entity, rhs),
        Query::Intersect(lhs, rhs) => is_match(entity, lhs) && is_match(entity, rhs),
        Query::Subtract(keep, minus) => is_match(entity, keep) && !is_match(entity, minus),
        Query::Complement(inner) => !is_match(entity, inner),
    }
}

/// Filter-side optional string against an entity-side optional string.
/// Empty filter string means "must be absent or empty on the entity".
fn text_matches(filter: &Option<String>, value: &Option<String>) -> bool {
    match filter.as_deref() {
        None => true,
        Some("") => value.as_deref().map_or(true, str::is_empty),
        Some(expected) => value.as_deref() == Some(expected),
    }
}

impl MatchesAtom<DetailQueryAtom> for VoucherDetail {
    fn matches_atom(&self, atom: &DetailQueryAtom) -> bool {
        if let Some(user) = &atom.user {
            if self.user != *user {
                return false;
            }
        }
        if let Some(currency) = &atom.currency {
            if self.currency != *currency {
                return false;
            }
        }
        if let Some(title) = atom.title {
            if self.title != title {
                return false;
            }
        }
        match atom.sub_title {
            // Zero is the "explicitly none" sentinel: match only details with
            // the subtitle unset, never a literal zero subtitle.
            Some(0) => {
                if self.sub_title.is_some() {
                    return false;
                }
            }
            Some(sub) => {
                if self.sub_title != Some(sub) {
                    return false;
                }
            }
            None => {}
        }
        if !text_matches(&atom.content, &self.content) {
            return false;
        }
        if !text_matches(&atom.remark, &self.remark) {
            return false;
        }
        if let Some(fund) = atom.fund {
            match self.fund {
                Some(actual) if is_equal(actual, fund) => {}
                _ => return false,
            }
        }
        match atom.direction {
            FundDirection::All => true,
            // A detail with an unset fund never satisfies a directional
            // constraint.
            FundDirection::Debit => self.fund.is_some_and(is_non_negative),
            FundDirection::Credit => self.fund.is_some_and(is_non_positive),
        }
    }
}

impl MatchesAtom<VoucherQueryAtom> for Voucher {
    fn matches_atom(&self, atom: &VoucherQueryAtom) -> bool {
        if let Some(id) = &atom.id {
            if self.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(vtype) = atom.vtype {
            if !self.vtype.satisfies(vtype) {
                return false;
            }
        }
        if let Some(currency) = &atom.currency {
            if self.currency != *currency {
                return false;
            }
        }
        if !text_matches(&atom.remark, &self.remark) {
            return false;
        }
        if !atom.range.contains(self.date) {
            return false;
        }
        if atom.for_all {
            self.details.iter().all(|d| is_match(d, &atom.details))
        } else {
            self.details.iter().any(|d| is_match(d, &atom.details))
        }
    }
}
