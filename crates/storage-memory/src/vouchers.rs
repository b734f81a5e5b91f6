//! In-memory voucher repository.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use tallybook_core::errors::Result;
use tallybook_core::query::{is_match, DetailQueryAtom, Query, VoucherQueryAtom};
use tallybook_core::subtotal::{flatten_rows, Balance};
use tallybook_core::utils::date_utils::compare_date;
use tallybook_core::vouchers::{Voucher, VoucherRepositoryTrait};

/// Voucher repository over a concurrent map.
///
/// `select` returns matches ordered by date (undated first) so callers see a
/// stable chronology regardless of map iteration order.
#[derive(Default)]
pub struct MemoryVoucherRepository {
    vouchers: DashMap<String, Voucher>,
}

impl MemoryVoucherRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoucherRepositoryTrait for MemoryVoucherRepository {
    fn get(&self, id: &str) -> Result<Option<Voucher>> {
        Ok(self.vouchers.get(id).map(|entry| entry.value().clone()))
    }

    fn select(&self, query: &Query<VoucherQueryAtom>) -> Result<Vec<Voucher>> {
        let mut matched: Vec<Voucher> = self
            .vouchers
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| {
            compare_date(a.date, b.date).then_with(|| a.id.cmp(&b.id))
        });
        Ok(matched)
    }

    async fn upsert(&self, mut voucher: Voucher) -> Result<Voucher> {
        let id = voucher
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        self.vouchers.insert(id, voucher.clone());
        Ok(voucher)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.vouchers.remove(id).is_some())
    }

    async fn delete_by_query(&self, query: &Query<VoucherQueryAtom>) -> Result<usize> {
        let doomed: Vec<String> = self
            .vouchers
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.vouchers.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn select_grouped(
        &self,
        query: &Query<VoucherQueryAtom>,
        details: &Query<DetailQueryAtom>,
    ) -> Result<Vec<Balance>> {
        let matched = self.select(query)?;
        Ok(flatten_rows(&matched, details))
    }
}
