//! In-memory asset repository.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use tallybook_core::assets::{Asset, AssetRepositoryTrait};
use tallybook_core::errors::Result;
use tallybook_core::query::{is_match, DistributedQueryAtom, Query};
use tallybook_core::utils::date_utils::compare_date;

/// Asset repository over a concurrent map.
#[derive(Default)]
pub struct MemoryAssetRepository {
    assets: DashMap<Uuid, Asset>,
}

impl MemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetRepositoryTrait for MemoryAssetRepository {
    fn get(&self, id: Uuid) -> Result<Option<Asset>> {
        Ok(self.assets.get(&id).map(|entry| entry.value().clone()))
    }

    fn select(&self, query: &Query<DistributedQueryAtom>) -> Result<Vec<Asset>> {
        let mut matched: Vec<Asset> = self
            .assets
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| entry.value().clone())
            .collect();
        matched.sort_by(|a, b| compare_date(a.date, b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }

    async fn upsert(&self, mut asset: Asset) -> Result<Asset> {
        let id = *asset.id.get_or_insert_with(Uuid::new_v4);
        self.assets.insert(id, asset.clone());
        Ok(asset)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.assets.remove(&id).is_some())
    }

    async fn delete_by_query(&self, query: &Query<DistributedQueryAtom>) -> Result<usize> {
        let doomed: Vec<Uuid> = self
            .assets
            .iter()
            .filter(|entry| is_match(entry.value(), query))
            .map(|entry| *entry.key())
            .collect();
        let mut removed = 0;
        for id in doomed {
            if self.assets.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
