//! In-memory amortization repository.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use tallybook_core::amortizations::{Amortization, AmortizationRepositoryTrait};
use tallybook_core::errors::Result;
use tallybook_core::query::{is_match, DistributedQueryAtom, Query};
use tallybook_core::utils::date_utils::compare_date;

/// Amortization repository over a concurrent map.
#[derive(Default)]
pub struct MemoryAmortizationRepository {
    amortizations: DashMap<Uuid, Amortization>,
}

impl MemoryAmortizationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AmortizationRepositoryTrait for MemoryAmortizationRepository {
    fn get(&self, id: Uuid) -> Result<Option<Amortization>> {
        Ok(self.amortizations.get(&id).map(|entry| entry.value().clone()))
    }

    fn select(&self, query: &Query<DistributedQueryAtom>) -> Result<Vec<Amortization>> {
        let mut matched: Vec<Amortization> = self
            .amortizations
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| compare_date(a.date, b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn upsert(&self, mut amortization: Amortization) -> Result<Amortization> {
        let id = *amortization.id.get_or_insert_with(Uuid::new_v4);
        self.amortizations.insert(id, amortization.clone());
        Ok(amortization)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.amortizations.remove(&id).is_some())
    }

    async fn delete_by_query(&self, query: &Query<DistributedQueryAtom>) -> Result<usize> {
        let doomed: Vec<Uuid> = self
            .amortizations
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| *entry.key())
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.amortizations.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
