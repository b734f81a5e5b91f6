//! Conservative voucher/detail reconciliation shared by both accountants.
//!
//! Reconciliation never guesses at a financially meaningful binding: zero or
//! multiple candidates are surfaced to the caller for manual resolution, and
//! stored details are adjusted only where they actually diverge.

use chrono::NaiveDate;

use crate::utils::numeric_utils::{is_equal, is_zero};
use crate::vouchers::{Voucher, VoucherDetail};

/// Outcome of aligning one template leg with a stored voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailUpdate {
    /// The leg already carried the expected fund.
    Unchanged,
    /// The leg existed with a divergent fund and was adjusted in place.
    Modified,
    /// No leg matched and the expected amount was non-zero; a fresh leg was added.
    Added,
    /// More than one stored leg matched the template shape.
    Ambiguous,
}

/// Result of reconciling a whole voucher against a set of expected legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every leg already matched; nothing written.
    Unchanged,
    /// At least one leg was adjusted or added; the voucher needs persisting.
    Modified,
    /// Some template leg matched more than one stored leg; nothing written.
    Ambiguous,
}

/// Scales a template voucher's split to one period's amount.
///
/// Template detail funds describe the split of the whole distributed value;
/// each expected leg fund is `template_fund × amount / Σ(positive funds)`.
/// For the common two-leg template this degenerates to ±amount. A template
/// with no positive leg falls back to sign-only scaling.
pub fn scale_template(template: &Voucher, amount: f64) -> Vec<(VoucherDetail, f64)> {
    let positive: f64 = template
        .details
        .iter()
        .filter_map(|d| d.fund)
        .filter(|f| *f > 0.0)
        .sum();
    template
        .details
        .iter()
        .map(|detail| {
            let fund = detail.fund.unwrap_or(0.0);
            let expected = if is_zero(positive) {
                amount * fund.signum()
            } else {
                fund * amount / positive
            };
            (detail.clone(), expected)
        })
        .collect()
}

/// Aligns one template leg of `voucher` with its expected fund.
fn update_detail(
    voucher: &mut Voucher,
    template: &VoucherDetail,
    expected_fund: f64,
) -> DetailUpdate {
    let matches: Vec<usize> = voucher
        .details
        .iter()
        .enumerate()
        .filter(|(_, d)| d.same_shape(template))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [] => {
            if is_zero(expected_fund) {
                return DetailUpdate::Unchanged;
            }
            let mut fresh = template.clone();
            fresh.fund = Some(expected_fund);
            voucher.details.push(fresh);
            DetailUpdate::Added
        }
        [index] => {
            let detail = &mut voucher.details[*index];
            match detail.fund {
                Some(actual) if is_equal(actual, expected_fund) => DetailUpdate::Unchanged,
                _ => {
                    detail.fund = Some(expected_fund);
                    DetailUpdate::Modified
                }
            }
        }
        _ => DetailUpdate::Ambiguous,
    }
}

/// Reconciles a stored voucher against the expected legs of one schedule
/// item. Ambiguity is detected up front so a voucher is never half-written.
pub fn reconcile_voucher(
    voucher: &mut Voucher,
    expected: &[(VoucherDetail, f64)],
) -> ReconcileOutcome {
    for (template, _) in expected {
        let shape_matches = voucher
            .details
            .iter()
            .filter(|d| d.same_shape(template))
            .count();
        if shape_matches > 1 {
            return ReconcileOutcome::Ambiguous;
        }
    }
    let mut modified = false;
    for (template, expected_fund) in expected {
        match update_detail(voucher, template, *expected_fund) {
            DetailUpdate::Unchanged => {}
            DetailUpdate::Modified | DetailUpdate::Added => modified = true,
            // Ruled out by the scan above.
            DetailUpdate::Ambiguous => return ReconcileOutcome::Ambiguous,
        }
    }
    if modified {
        ReconcileOutcome::Modified
    } else {
        ReconcileOutcome::Unchanged
    }
}

/// Bidirectionally-unique date binding for registration.
///
/// `open_dates` are the (index, date) pairs of still-unbound schedule items
/// inside the caller's range. A candidate voucher binds to an item only when
/// exactly one open item shares its date AND no other candidate targets that
/// item; everything else stays unbound for manual review.
pub fn bind_candidates(
    candidates: &[Voucher],
    open_dates: &[(usize, Option<NaiveDate>)],
) -> Vec<Option<usize>> {
    let match_lists: Vec<Vec<usize>> = candidates
        .iter()
        .map(|voucher| {
            open_dates
                .iter()
                .filter(|(_, date)| *date == voucher.date)
                .map(|(index, _)| *index)
                .collect()
        })
        .collect();
    let mut claims: Vec<usize> = vec![0; open_dates.len()];
    for list in &match_lists {
        if let [only] = list.as_slice() {
            if let Some(slot) = open_dates.iter().position(|(index, _)| index == only) {
                claims[slot] += 1;
            }
        }
    }
    match_lists
        .into_iter()
        .map(|list| match list.as_slice() {
            [only] => {
                let slot = open_dates.iter().position(|(index, _)| index == only)?;
                if claims[slot] == 1 {
                    Some(*only)
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect()
}
