//! Amortization repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use super::amortizations_model::Amortization;
use crate::errors::Result;
use crate::query::{DistributedQueryAtom, Query};

/// Trait defining the contract for amortization persistence.
#[async_trait]
pub trait AmortizationRepositoryTrait: Send + Sync {
    /// Retrieves an amortization by id.
    fn get(&self, id: Uuid) -> Result<Option<Amortization>>;

    /// Selects all amortizations matching the query.
    fn select(&self, query: &Query<DistributedQueryAtom>) -> Result<Vec<Amortization>>;

    /// Inserts or replaces an amortization, assigning an id when absent.
    async fn upsert(&self, amortization: Amortization) -> Result<Amortization>;

    /// Deletes an amortization by id. Returns whether anything was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Deletes every amortization matching the query. Returns the count.
    async fn delete_by_query(&self, query: &Query<DistributedQueryAtom>) -> Result<usize>;
}
