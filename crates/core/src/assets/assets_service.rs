use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};

use super::assets_model::{Asset, AssetScheduleItem, DepreciationMethod};
use super::assets_traits::AssetRepositoryTrait;
use crate::constants::BASE_CURRENCY;
use crate::distributed::{
    bind_candidates, is_ignored, reconcile_voucher, ReconcileOutcome, ResetMode, ScheduleError,
    ScheduleItemCore,
};
use crate::errors::Result;
use crate::query::{DateRange, DetailQueryAtom, DistributedQueryAtom, Query, VoucherQueryAtom};
use crate::utils::date_utils::{compare_date, month_end, shift_months, year_end};
use crate::utils::numeric_utils::{is_non_positive, is_zero};
use crate::vouchers::{Voucher, VoucherDetail, VoucherServiceTrait, VoucherType};

/// Regenerates the asset's depreciation items.
///
/// Manually-pinned (ignorance-marked) depreciation items and every
/// non-depreciation event are preserved; months they cover are skipped, and
/// the amortization base re-anchors whenever an acquisition, devaluation, or
/// disposition interrupts the timeline.
pub fn depreciate(asset: &mut Asset) -> Result<()> {
    asset.validate()?;
    let acquired = asset.date.ok_or_else(|| {
        ScheduleError::InvalidSchedule("asset has no acquisition date".to_string())
    })?;
    if matches!(asset.method, DepreciationMethod::DoubleDecliningBalance) {
        return Err(
            ScheduleError::UnsupportedMethod("DOUBLE_DECLINING_BALANCE".to_string()).into(),
        );
    }
    // Bring pinned devaluation amounts and the leading acquisition up to date
    // before the walk consumes them.
    regularize_asset(asset);
    match asset.method {
        DepreciationMethod::StraightLine => depreciate_straight_line(asset, acquired),
        DepreciationMethod::SumOfTheYears => depreciate_sum_of_years(asset, acquired),
        DepreciationMethod::DoubleDecliningBalance => unreachable!(),
    }
    regularize_asset(asset);
    Ok(())
}

/// Pinned events survive regeneration: every non-depreciation item, plus
/// depreciation items carrying the ignorance mark.
fn pinned_events(asset: &mut Asset) -> Vec<AssetScheduleItem> {
    let mut pinned: Vec<AssetScheduleItem> = asset
        .schedule
        .drain(..)
        .filter(|item| {
            !matches!(item, AssetScheduleItem::Depreciation { .. })
                || is_ignored(item.core().remark.as_deref())
        })
        .collect();
    if !pinned
        .iter()
        .any(|item| matches!(item, AssetScheduleItem::Acquisition { .. }))
    {
        pinned.insert(
            0,
            AssetScheduleItem::Acquisition {
                core: ScheduleItemCore {
                    date: asset.date,
                    voucher_id: None,
                    value: 0.0,
                    remark: None,
                },
                orig_value: asset.value,
            },
        );
    }
    pinned.sort_by(|a, b| compare_date(a.date(), b.date()));
    pinned
}

fn apply_to_book(item: &AssetScheduleItem, book: &mut f64) {
    match item {
        AssetScheduleItem::Acquisition { orig_value, .. } => *book += orig_value,
        AssetScheduleItem::Depreciation { amount, .. } => *book -= amount,
        AssetScheduleItem::Devaluation { amount, .. } => *book -= amount,
        AssetScheduleItem::Disposition { .. } => *book = 0.0,
    }
}

fn same_month(a: Option<NaiveDate>, b: NaiveDate) -> bool {
    a.is_some_and(|d| (d.year(), d.month()) == (b.year(), b.month()))
}

/// Equal monthly installments over `life × 12` months starting in the
/// acquisition month. Each month's amount is the remaining base spread over
/// the remaining months, so interruptions re-anchor naturally and an
/// uninterrupted timeline yields equal installments; the final month takes
/// the whole residual.
fn depreciate_straight_line(asset: &mut Asset, acquired: NaiveDate) {
    let total_months = asset.life * 12;
    let pinned = pinned_events(asset);
    let mut events = pinned.into_iter().peekable();

    let mut result = Vec::new();
    let mut book = 0.0;
    let mut disposed = false;
    for index in 0..total_months {
        let month = month_end(shift_months(acquired, index));
        let mut covered = false;
        while let Some(event) = events.peek() {
            if compare_date(event.date(), Some(month)) == std::cmp::Ordering::Greater {
                break;
            }
            let event = events.next().expect("peeked event");
            apply_to_book(&event, &mut book);
            if matches!(event, AssetScheduleItem::Depreciation { .. })
                && same_month(event.date(), month)
            {
                covered = true;
            }
            if matches!(event, AssetScheduleItem::Disposition { .. }) {
                disposed = true;
            }
            result.push(event);
        }
        if disposed {
            break;
        }
        if covered {
            continue;
        }
        let base = book - asset.salvage;
        if is_non_positive(base) {
            continue;
        }
        let amount = if index == total_months - 1 {
            base
        } else {
            base / (total_months - index) as f64
        };
        if is_zero(amount) {
            continue;
        }
        result.push(AssetScheduleItem::Depreciation {
            core: ScheduleItemCore {
                date: Some(month),
                voucher_id: None,
                value: 0.0,
                remark: None,
            },
            amount,
        });
        book -= amount;
    }
    result.extend(events);
    asset.schedule = result;
}

/// Declining yearly fractions `(n - year + 1) / Σ1..n` of `value - salvage`,
/// accrued monthly and emitted per calendar year, so partial first/last years
/// are pro-rated by acquisition month. The final item absorbs the residual.
fn depreciate_sum_of_years(asset: &mut Asset, acquired: NaiveDate) {
    let years = asset.life;
    let triangle = (years * (years + 1) / 2) as f64;
    let base_total = asset.value - asset.salvage;
    let total_months = years * 12;

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for month in 0..total_months {
        let year_fraction = (years - month / 12) as f64 / triangle;
        let calendar = shift_months(acquired, month).year();
        *by_year.entry(calendar).or_insert(0.0) += base_total * year_fraction / 12.0;
    }

    let pinned = pinned_events(asset);
    let mut result: Vec<AssetScheduleItem> = pinned;
    let last_index = by_year.len().saturating_sub(1);
    let mut booked = 0.0;
    for (index, (calendar, amount)) in by_year.into_iter().enumerate() {
        let (date, amount) = if index == last_index {
            let final_month = month_end(shift_months(acquired, total_months - 1));
            (final_month, base_total - booked)
        } else {
            let first_of_year = NaiveDate::from_ymd_opt(calendar, 1, 1).unwrap_or(acquired);
            (year_end(first_of_year), amount)
        };
        if is_zero(amount) {
            continue;
        }
        booked += amount;
        result.push(AssetScheduleItem::Depreciation {
            core: ScheduleItemCore {
                date: Some(date),
                voucher_id: None,
                value: 0.0,
                remark: None,
            },
            amount,
        });
    }
    asset.schedule = result;
}

/// Re-derives the running book value across the schedule.
///
/// Depreciation/devaluation dates snap to month end, the schedule re-sorts
/// (undated first), a missing leading acquisition is synthesized from the
/// asset's own date/value, and moot devaluations prune themselves: a
/// non-pinned write-down to a fair value the book already sits at or below
/// is dropped. Pruning is a rebuild into a fresh list, never in-place
/// removal during iteration.
pub fn regularize_asset(asset: &mut Asset) {
    if is_ignored(asset.remark.as_deref()) {
        return;
    }
    for item in &mut asset.schedule {
        if let AssetScheduleItem::Depreciation { core, .. }
        | AssetScheduleItem::Devaluation { core, .. } = item
        {
            core.date = core.date.map(month_end);
        }
    }
    asset
        .schedule
        .sort_by(|a, b| compare_date(a.date(), b.date()));
    if !matches!(
        asset.schedule.first(),
        Some(AssetScheduleItem::Acquisition { .. })
    ) {
        asset.schedule.insert(
            0,
            AssetScheduleItem::Acquisition {
                core: ScheduleItemCore {
                    date: asset.date,
                    voucher_id: None,
                    value: 0.0,
                    remark: None,
                },
                orig_value: asset.value,
            },
        );
    }

    let mut retained = Vec::with_capacity(asset.schedule.len());
    let mut book = 0.0;
    for mut item in asset.schedule.drain(..) {
        match &mut item {
            AssetScheduleItem::Acquisition { core, orig_value } => {
                book += *orig_value;
                core.value = book;
            }
            AssetScheduleItem::Depreciation { core, amount } => {
                book -= *amount;
                core.value = book;
            }
            AssetScheduleItem::Devaluation {
                core,
                fair_value,
                amount,
            } => {
                if !is_ignored(core.remark.as_deref()) {
                    let write_down = book - *fair_value;
                    if is_non_positive(write_down) {
                        // Book value already at or below fair value: the
                        // revaluation is moot and removes itself.
                        continue;
                    }
                    *amount = write_down;
                }
                book -= *amount;
                core.value = book;
            }
            AssetScheduleItem::Disposition { core } => {
                book = 0.0;
                core.value = 0.0;
            }
        }
        retained.push(item);
    }
    asset.schedule = retained;
}

/// Service for managing assets and keeping their schedules consistent with
/// the stored vouchers.
pub struct AssetService {
    repository: Arc<dyn AssetRepositoryTrait>,
    vouchers: Arc<dyn VoucherServiceTrait>,
}

impl AssetService {
    pub fn new(
        repository: Arc<dyn AssetRepositoryTrait>,
        vouchers: Arc<dyn VoucherServiceTrait>,
    ) -> Self {
        Self {
            repository,
            vouchers,
        }
    }

    // === Entity CRUD pass-throughs ===

    pub fn get_asset(&self, id: uuid::Uuid) -> Result<Option<Asset>> {
        self.repository.get(id)
    }

    pub fn select_assets(&self, query: &Query<DistributedQueryAtom>) -> Result<Vec<Asset>> {
        self.repository.select(query)
    }

    pub async fn upsert_asset(&self, asset: Asset) -> Result<Asset> {
        asset.validate()?;
        self.repository.upsert(asset).await
    }

    pub async fn delete_asset(&self, id: uuid::Uuid) -> Result<bool> {
        self.repository.delete(id).await
    }

    // === Reconciliation ===

    /// Binds hand-entered vouchers referencing the asset's accounts to
    /// unlinked schedule items by date. Returns the vouchers that could not
    /// be bound unambiguously.
    pub async fn register_vouchers(
        &self,
        asset: &mut Asset,
        range: &DateRange,
        query: &Query<VoucherQueryAtom>,
    ) -> Result<Vec<Voucher>> {
        if is_ignored(asset.remark.as_deref()) {
            return Ok(Vec::new());
        }
        let referencing = Query::intersect(vec![query.clone(), account_reference_query(asset)]);
        let stored = self.vouchers.select_vouchers(&referencing)?;

        let linked: HashSet<&str> = asset
            .schedule
            .iter()
            .filter_map(|item| item.core().voucher_id.as_deref())
            .collect();
        let mut unresolved = Vec::new();
        let mut by_kind: BTreeMap<ItemKind, Vec<Voucher>> = BTreeMap::new();
        for voucher in stored {
            if voucher.id.as_deref().is_some_and(|id| linked.contains(id)) {
                continue;
            }
            match classify_candidate(asset, &voucher) {
                Some(kind) => by_kind.entry(kind).or_default().push(voucher),
                None => unresolved.push(voucher),
            }
        }

        for (kind, candidates) in by_kind {
            let open: Vec<(usize, Option<NaiveDate>)> = asset
                .schedule
                .iter()
                .enumerate()
                .filter(|(_, item)| {
                    item_kind(item) == kind
                        && item.core().voucher_id.is_none()
                        && range.contains(item.core().date)
                })
                .map(|(index, item)| (index, item.core().date))
                .collect();
            let bindings = bind_candidates(&candidates, &open);
            for (voucher, binding) in candidates.into_iter().zip(bindings) {
                match binding {
                    Some(index) => {
                        asset.schedule[index].core_mut().voucher_id = voucher.id.clone();
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
        }
        self.repository.upsert(asset.clone()).await?;
        Ok(unresolved)
    }

    /// Reconciles schedule items in range against their vouchers. Linked
    /// vouchers are confirmed (only divergent details adjusted); missing
    /// depreciation/devaluation/disposition vouchers are generated unless
    /// `edit_only`; acquisitions are confirm-only. Returns every item that
    /// could not be auto-reconciled.
    pub async fn update(
        &self,
        asset: &mut Asset,
        range: &DateRange,
        collapsed: bool,
        edit_only: bool,
    ) -> Result<Vec<AssetScheduleItem>> {
        if is_ignored(asset.remark.as_deref()) {
            return Ok(Vec::new());
        }
        let entity_id = asset
            .id
            .ok_or_else(|| ScheduleError::InvalidSchedule("asset not persisted".to_string()))?
            .to_string();
        debug!(
            "Updating asset {} over {} schedule items",
            entity_id,
            asset.schedule.len()
        );

        let mut failures = Vec::new();
        for index in 0..asset.schedule.len() {
            let item = asset.schedule[index].clone();
            if !range.contains(item.core().date) || is_ignored(item.core().remark.as_deref()) {
                continue;
            }
            let expected_date = if collapsed { None } else { item.core().date };
            let expected = expected_legs(asset, index, &item);
            let vtype = voucher_type_for(&item);
            let generates = !matches!(item, AssetScheduleItem::Acquisition { .. });

            match item.core().voucher_id.as_deref() {
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
                    if edit_only || !generates {
                        failures.push(item);
                        continue;
                    }
                    let voucher = Voucher {
                        id: None,
                        date: expected_date,
                        vtype,
                        currency: BASE_CURRENCY.to_string(),
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
                    asset.schedule[index].core_mut().voucher_id = stored.id.clone();
                }
            }
        }
        self.repository.upsert(asset.clone()).await?;
        Ok(failures)
    }

    /// Unwinds voucher links. `Soft` clears links to vouchers that no longer
    /// exist; `Mixed` additionally deletes the vouchers that do; `Hard`
    /// deletes every generated voucher (those carrying the asset's id as
    /// remark) by query, then clears all links. Returns the number of links
    /// cleared.
    pub async fn reset(&self, asset: &mut Asset, mode: ResetMode) -> Result<usize> {
        let mut cleared = 0;
        match mode {
            ResetMode::Soft => {
                for item in &mut asset.schedule {
                    if let Some(voucher_id) = item.core().voucher_id.clone() {
                        if self.vouchers.get_voucher(&voucher_id)?.is_none() {
                            item.core_mut().voucher_id = None;
                            cleared += 1;
                        }
                    }
                }
            }
            ResetMode::Mixed => {
                for item in &mut asset.schedule {
                    if let Some(voucher_id) = item.core_mut().voucher_id.take() {
                        self.vouchers.delete_voucher(&voucher_id).await?;
                        cleared += 1;
                    }
                }
            }
            ResetMode::Hard => {
                let entity_id = asset
                    .id
                    .ok_or_else(|| {
                        ScheduleError::InvalidSchedule("asset not persisted".to_string())
                    })?
                    .to_string();
                let generated = Query::atom(VoucherQueryAtom {
                    remark: Some(entity_id),
                    ..Default::default()
                });
                self.vouchers.delete_vouchers(&generated).await?;
                for item in &mut asset.schedule {
                    if item.core_mut().voucher_id.take().is_some() {
                        cleared += 1;
                    }
                }
            }
        }
        self.repository.upsert(asset.clone()).await?;
        Ok(cleared)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ItemKind {
    Acquisition,
    Depreciation,
    Devaluation,
    Disposition,
}

fn item_kind(item: &AssetScheduleItem) -> ItemKind {
    match item {
        AssetScheduleItem::Acquisition { .. } => ItemKind::Acquisition,
        AssetScheduleItem::Depreciation { .. } => ItemKind::Depreciation,
        AssetScheduleItem::Devaluation { .. } => ItemKind::Devaluation,
        AssetScheduleItem::Disposition { .. } => ItemKind::Disposition,
    }
}

fn voucher_type_for(item: &AssetScheduleItem) -> VoucherType {
    match item {
        AssetScheduleItem::Depreciation { .. } => VoucherType::Depreciation,
        AssetScheduleItem::Devaluation { .. } => VoucherType::Devalue,
        AssetScheduleItem::Acquisition { .. } | AssetScheduleItem::Disposition { .. } => {
            VoucherType::Ordinary
        }
    }
}

fn leg(asset: &Asset, title: i32, sub_title: Option<i32>) -> VoucherDetail {
    VoucherDetail {
        user: asset.user.clone(),
        currency: BASE_CURRENCY.to_string(),
        title,
        sub_title,
        content: asset.name.clone(),
        fund: None,
        remark: None,
    }
}

/// Expected voucher legs for one schedule item.
fn expected_legs(asset: &Asset, index: usize, item: &AssetScheduleItem) -> Vec<(VoucherDetail, f64)> {
    match item {
        AssetScheduleItem::Acquisition { orig_value, .. } => {
            vec![(leg(asset, asset.title, None), *orig_value)]
        }
        AssetScheduleItem::Depreciation { amount, .. } => vec![
            (
                leg(asset, asset.expense_title, asset.expense_sub_title),
                *amount,
            ),
            (leg(asset, asset.depreciation_title, None), -*amount),
        ],
        AssetScheduleItem::Devaluation { amount, .. } => vec![
            (
                leg(
                    asset,
                    asset.devaluation_expense_title,
                    asset.devaluation_expense_sub_title,
                ),
                *amount,
            ),
            (leg(asset, asset.devaluation_title, None), -*amount),
        ],
        AssetScheduleItem::Disposition { .. } => {
            let mut acquired = 0.0;
            let mut depreciated = 0.0;
            let mut devalued = 0.0;
            for earlier in &asset.schedule[..index] {
                match earlier {
                    AssetScheduleItem::Acquisition { orig_value, .. } => acquired += orig_value,
                    AssetScheduleItem::Depreciation { amount, .. } => depreciated += amount,
                    AssetScheduleItem::Devaluation { amount, .. } => devalued += amount,
                    AssetScheduleItem::Disposition { .. } => {
                        acquired = 0.0;
                        depreciated = 0.0;
                        devalued = 0.0;
                    }
                }
            }
            // Reverse the asset account, reverse both accumulated contra
            // accounts, and book the net against the disposal clearing leg.
            vec![
                (leg(asset, asset.title, None), -acquired),
                (leg(asset, asset.depreciation_title, None), depreciated),
                (leg(asset, asset.devaluation_title, None), devalued),
                (
                    leg(asset, asset.disposal_title, None),
                    acquired - depreciated - devalued,
                ),
            ]
        }
    }
}

/// Query for vouchers referencing the asset account or either accumulated
/// contra account, tagged with the asset's name.
fn account_reference_query(asset: &Asset) -> Query<VoucherQueryAtom> {
    let content = Some(asset.name.clone().unwrap_or_default());
    let legs: Vec<Query<DetailQueryAtom>> = [
        asset.title,
        asset.depreciation_title,
        asset.devaluation_title,
    ]
    .into_iter()
    .map(|title| {
        Query::atom(DetailQueryAtom {
            title: Some(title),
            content: content.clone(),
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

/// Determines which schedule item kind a candidate voucher instantiates.
fn classify_candidate(asset: &Asset, voucher: &Voucher) -> Option<ItemKind> {
    let depreciation_shape = Voucher {
        details: vec![
            leg(asset, asset.expense_title, asset.expense_sub_title),
            leg(asset, asset.depreciation_title, None),
        ],
        ..Default::default()
    };
    if voucher.matches_template(&depreciation_shape) {
        return Some(ItemKind::Depreciation);
    }
    let devaluation_shape = Voucher {
        details: vec![
            leg(
                asset,
                asset.devaluation_expense_title,
                asset.devaluation_expense_sub_title,
            ),
            leg(asset, asset.devaluation_title, None),
        ],
        ..Default::default()
    };
    if voucher.matches_template(&devaluation_shape) {
        return Some(ItemKind::Devaluation);
    }
    let asset_leg = leg(asset, asset.title, None);
    let on_asset_account = voucher
        .details
        .iter()
        .find(|detail| detail.same_shape(&asset_leg));
    match on_asset_account {
        Some(detail) if detail.fund.is_some_and(|f| f < 0.0) => Some(ItemKind::Disposition),
        Some(_) => Some(ItemKind::Acquisition),
        None => None,
    }
}
