//! Asset repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use super::assets_model::Asset;
use crate::errors::Result;
use crate::query::{DistributedQueryAtom, Query};

/// Trait defining the contract for asset persistence.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    /// Retrieves an asset by id.
    fn get(&self, id: Uuid) -> Result<Option<Asset>>;

    /// Selects all assets matching the query.
    fn select(&self, query: &Query<DistributedQueryAtom>) -> Result<Vec<Asset>>;

    /// Inserts or replaces an asset, assigning an id when absent.
    async fn upsert(&self, asset: Asset) -> Result<Asset>;

    /// Deletes an asset by id. Returns whether anything was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Deletes every asset matching the query. Returns the count.
    async fn delete_by_query(&self, query: &Query<DistributedQueryAtom>) -> Result<usize>;
}
