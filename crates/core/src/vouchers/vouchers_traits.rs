//! Voucher repository and service traits.
//!
//! These traits define the contract for voucher operations without any
//! storage-specific types, allowing for different adapter implementations.

use async_trait::async_trait;

use crate::errors::Result;
use crate::query::{DetailQueryAtom, Query, VoucherQueryAtom};
use crate::subtotal::{Balance, SubtotalNode, SubtotalSpec};
use crate::vouchers::vouchers_model::Voucher;

/// Trait defining the contract for voucher persistence.
///
/// `upsert` receives vouchers already canonicalized and balanced by the
/// service layer; the repository only assigns an id when absent and stores.
#[async_trait]
pub trait VoucherRepositoryTrait: Send + Sync {
    /// Retrieves a voucher by id.
    fn get(&self, id: &str) -> Result<Option<Voucher>>;

    /// Selects all vouchers matching the query.
    fn select(&self, query: &Query<VoucherQueryAtom>) -> Result<Vec<Voucher>>;

    /// Inserts or replaces a voucher, assigning an id when absent.
    async fn upsert(&self, voucher: Voucher) -> Result<Voucher>;

    /// Deletes a voucher by id. Returns whether anything was deleted.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Deletes every voucher matching the query. Returns the count.
    async fn delete_by_query(&self, query: &Query<VoucherQueryAtom>) -> Result<usize>;

    /// Selects flattened detail rows for the matched vouchers.
    ///
    /// An adapter MAY push the grouping down to its backend as long as the
    /// result is semantically equivalent to flattening the full matched
    /// row-set in core.
    fn select_grouped(
        &self,
        query: &Query<VoucherQueryAtom>,
        details: &Query<DetailQueryAtom>,
    ) -> Result<Vec<Balance>>;
}

/// Trait defining the contract for voucher business operations.
#[async_trait]
pub trait VoucherServiceTrait: Send + Sync {
    /// Retrieves a voucher by id.
    fn get_voucher(&self, id: &str) -> Result<Option<Voucher>>;

    /// Selects all vouchers matching the query.
    fn select_vouchers(&self, query: &Query<VoucherQueryAtom>) -> Result<Vec<Voucher>>;

    /// Validates, balances, canonicalizes, and persists a voucher.
    async fn upsert_voucher(&self, voucher: Voucher) -> Result<Voucher>;

    /// Deletes a voucher by id.
    async fn delete_voucher(&self, id: &str) -> Result<bool>;

    /// Deletes every voucher matching the query.
    async fn delete_vouchers(&self, query: &Query<VoucherQueryAtom>) -> Result<usize>;

    /// Selects, flattens, and aggregates matched details into a subtotal tree.
    fn subtotal(
        &self,
        query: &Query<VoucherQueryAtom>,
        details: &Query<DetailQueryAtom>,
        spec: &SubtotalSpec,
    ) -> Result<SubtotalNode>;
}
