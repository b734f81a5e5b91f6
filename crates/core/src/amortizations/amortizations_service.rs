use std::collections::HashSet;
use std::sync::Arc;

use chrono::Days;
use log::{debug, warn};

use super::amortizations_model::{AmortItem, Amortization};
use super::amortizations_traits::AmortizationRepositoryTrait;
use crate::distributed::{
    bind_candidates, is_ignored, reconcile_voucher, scale_template, ReconcileOutcome, ResetMode,
    ScheduleError, ScheduleItemCore,
};
use crate::errors::Result;
use crate::query::{DateRange, DetailQueryAtom, DistributedQueryAtom, Query, VoucherQueryAtom};
use crate::utils::date_utils::{compare_date, day_span};
use crate::utils::numeric_utils::is_zero;
use crate::vouchers::{Voucher, VoucherServiceTrait, VoucherType};

/// Regenerates the full schedule from scratch.
///
/// Walks forward from the start date using the interval's recognition rule,
/// assigning each period a straight-line amount `value / total_days × days`.
/// The final period absorbs all residual so the schedule sums exactly to the
/// value despite floating-point division; zero-amount periods are dropped.
pub fn amortize(amortization: &mut Amortization) -> Result<()> {
    amortization.validate()?;
    let anchor = amortization.date.ok_or_else(|| {
        ScheduleError::InvalidSchedule("amortization has no start date".to_string())
    })?;
    let end = anchor + Days::new(amortization.total_days as u64 - 1);
    let daily = amortization.value / amortization.total_days as f64;

    let mut schedule = Vec::new();
    let mut period_start = anchor;
    let mut booked = 0.0;
    loop {
        let recognition = amortization.interval.next_from(anchor, period_start);
        if recognition >= end {
            let residual = amortization.value - booked;
            if !is_zero(residual) {
                schedule.push(period_item(recognition, residual));
            }
            break;
        }
        let amount = daily * day_span(period_start, recognition) as f64;
        if !is_zero(amount) {
            booked += amount;
            schedule.push(period_item(recognition, amount));
        }
        period_start = recognition + Days::new(1);
    }
    amortization.schedule = schedule;
    regularize(amortization);
    Ok(())
}

fn period_item(date: chrono::NaiveDate, amount: f64) -> AmortItem {
    AmortItem {
        core: ScheduleItemCore {
            date: Some(date),
            voucher_id: None,
            value: 0.0,
            remark: None,
        },
        amount,
    }
}

/// Re-sorts the schedule and recomputes each item's running value as the
/// residual after subtracting that item, top-down from the total value.
///
/// The ignorance mark on the whole entity short-circuits regularization
/// entirely (manual override).
pub fn regularize(amortization: &mut Amortization) {
    if is_ignored(amortization.remark.as_deref()) {
        return;
    }
    amortization
        .schedule
        .sort_by(|a, b| compare_date(a.core.date, b.core.date));
    let mut residual = amortization.value;
    for item in &mut amortization.schedule {
        residual -= item.amount;
        item.core.value = residual;
    }
}

/// Service for managing amortizations and keeping their schedules consistent
/// with the stored vouchers.
pub struct AmortizationService {
    repository: Arc<dyn AmortizationRepositoryTrait>,
    vouchers: Arc<dyn VoucherServiceTrait>,
}

impl AmortizationService {
    pub fn new(
        repository: Arc<dyn AmortizationRepositoryTrait>,
        vouchers: Arc<dyn VoucherServiceTrait>,
    ) -> Self {
        Self {
            repository,
            vouchers,
        }
    }

    // === Entity CRUD pass-throughs ===

    pub fn get_amortization(&self, id: uuid::Uuid) -> Result<Option<Amortization>> {
        self.repository.get(id)
    }

    pub fn select_amortizations(
        &self,
        query: &Query<DistributedQueryAtom>,
    ) -> Result<Vec<Amortization>> {
        self.repository.select(query)
    }

    pub async fn upsert_amortization(&self, amortization: Amortization) -> Result<Amortization> {
        amortization.validate()?;
        self.repository.upsert(amortization).await
    }

    pub async fn delete_amortization(&self, id: uuid::Uuid) -> Result<bool> {
        self.repository.delete(id).await
    }

    // === Reconciliation ===

    /// Binds hand-entered vouchers instantiating the template to unlinked
    /// schedule items by date. Returns the vouchers that could not be bound
    /// unambiguously, for manual review.
    pub async fn register_vouchers(
        &self,
        amortization: &mut Amortization,
        range: &DateRange,
        query: &Query<VoucherQueryAtom>,
    ) -> Result<Vec<Voucher>> {
        if is_ignored(amortization.remark.as_deref()) {
            return Ok(Vec::new());
        }
        let referencing = Query::intersect(vec![query.clone(), template_reference_query(amortization)]);
        let stored = self.vouchers.select_vouchers(&referencing)?;

        let linked: HashSet<&str> = amortization
            .schedule
            .iter()
            .filter_map(|item| item.core.voucher_id.as_deref())
            .collect();
        let mut unresolved = Vec::new();
        let mut eligible = Vec::new();
        for voucher in stored {
            let already = voucher.id.as_deref().is_some_and(|id| linked.contains(id));
            if already {
                continue;
            }
            if voucher.matches_template(&amortization.template) {
                eligible.push(voucher);
            } else {
                unresolved.push(voucher);
            }
        }

        let open: Vec<(usize, Option<chrono::NaiveDate>)> = amortization
            .schedule
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.core.voucher_id.is_none() && range.contains(item.core.date)
            })
            .map(|(index, item)| (index, item.core.date))
            .collect();
        let bindings = bind_candidates(&eligible, &open);
        for (voucher, binding) in eligible.into_iter().zip(bindings) {
            match binding {
                Some(index) => {
                    amortization.schedule[index].core.voucher_id = voucher.id.clone();
                }
                None => {
                    warn!(
                        "Ambiguous registration candidate {:?} on {:?}",
                        voucher.id, voucher.date
                    );
                    unresolved.push(voucher);
                }
            }
        }
        self.repository.upsert(amortization.clone()).await?;
        Ok(unresolved)
    }

    /// Reconciles schedule items in range against their vouchers: confirms
    /// linked vouchers (adjusting only actually-divergent details), generates
    /// missing vouchers unless `edit_only`, and returns every item that could
    /// not be auto-reconciled.
    pub async fn update(
        &self,
        amortization: &mut Amortization,
        range: &DateRange,
        collapsed: bool,
        edit_only: bool,
    ) -> Result<Vec<AmortItem>> {
        if is_ignored(amortization.remark.as_deref()) {
            return Ok(Vec::new());
        }
        let entity_id = amortization
            .id
            .ok_or_else(|| ScheduleError::InvalidSchedule("amortization not persisted".to_string()))?
            .to_string();
        debug!(
            "Updating amortization {} over {} schedule items",
            entity_id,
            amortization.schedule.len()
        );

        let mut failures = Vec::new();
        for index in 0..amortization.schedule.len() {
            let item = amortization.schedule[index].clone();
            if !range.contains(item.core.date) || is_ignored(item.core.remark.as_deref()) {
                continue;
            }
            // Collapsed reconciliation books every period as an undated
            // voucher.
            let expected_date = if collapsed { None } else { item.core.date };
            let expected = scale_template(&amortization.template, item.amount);

            match item.core.voucher_id.as_deref() {
                Some(voucher_id) => match self.vouchers.get_voucher(voucher_id)? {
                    None => {
                        warn!("Linked voucher {} no longer exists", voucher_id);
                        failures.push(item);
                    }
                    Some(mut voucher) => {
                        if voucher.date != expected_date {
                            failures.push(item);
                            continue;
                        }
                        match reconcile_voucher(&mut voucher, &expected) {
                            ReconcileOutcome::Ambiguous => failures.push(item),
                            ReconcileOutcome::Modified => {
                                self.vouchers.upsert_voucher(voucher).await?;
                            }
                            ReconcileOutcome::Unchanged => {}
                        }
                    }
                },
                None => {
                    if edit_only {
                        failures.push(item);
                        continue;
                    }
                    let voucher = Voucher {
                        id: None,
                        date: expected_date,
                        vtype: VoucherType::Amortization,
                        currency: amortization.template.currency.clone(),
                        remark: Some(entity_id.clone()),
                        details: expected
                            .iter()
                            .filter(|(_, fund)| !is_zero(*fund))
                            .map(|(template, fund)| {
                                let mut detail = template.clone();
                                detail.fund = Some(*fund);
                                detail
                            })
                            .collect(),
                    };
                    let stored = self.vouchers.upsert_voucher(voucher).await?;
                    amortization.schedule[index].core.voucher_id = stored.id.clone();
                }
            }
        }
        self.repository.upsert(amortization.clone()).await?;
        Ok(failures)
    }

    /// Unwinds voucher links. `Soft` clears links to vouchers that no longer
    /// exist; `Mixed` additionally deletes the vouchers that do. `Hard` is
    /// asset-only and fails. Returns the number of links cleared.
    pub async fn reset(
        &self,
        amortization: &mut Amortization,
        mode: ResetMode,
    ) -> Result<usize> {
        let mut cleared = 0;
        match mode {
            ResetMode::Hard => return Err(ScheduleError::HardResetUnsupported.into()),
            ResetMode::Soft => {
                for item in &mut amortization.schedule {
                    if let Some(voucher_id) = item.core.voucher_id.clone() {
                        if self.vouchers.get_voucher(&voucher_id)?.is_none() {
                            item.core.voucher_id = None;
                            cleared += 1;
                        }
                    }
                }
            }
            ResetMode::Mixed => {
                for item in &mut amortization.schedule {
                    if let Some(voucher_id) = item.core.voucher_id.take() {
                        self.vouchers.delete_voucher(&voucher_id).await?;
                        cleared += 1;
                    }
                }
            }
        }
        self.repository.upsert(amortization.clone()).await?;
        Ok(cleared)
    }
}

/// Query for vouchers referencing any of the template's legs by title,
/// subtitle, and content. An unset template subtitle becomes the "explicitly
/// none" filter sentinel.
fn template_reference_query(amortization: &Amortization) -> Query<VoucherQueryAtom> {
    let legs: Vec<Query<DetailQueryAtom>> = amortization
        .template
        .details
        .iter()
        .map(|detail| {
            Query::atom(DetailQueryAtom {
                title: Some(detail.title),
                sub_title: Some(detail.sub_title.unwrap_or(0)),
                content: Some(detail.content.clone().unwrap_or_default()),
                ..Default::default()
            })
        })
        .collect();
    Query::atom(VoucherQueryAtom {
        vtype: Some(VoucherType::General),
        details: Query::union(legs),
        ..Default::default()
    })
}
