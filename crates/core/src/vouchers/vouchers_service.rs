use log::debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::vouchers_model::Voucher;
use super::vouchers_traits::{VoucherRepositoryTrait, VoucherServiceTrait};
use crate::errors::Result;
use crate::query::{DetailQueryAtom, Query, VoucherQueryAtom};
use crate::subtotal::{SubtotalBuilder, SubtotalNode, SubtotalSpec};

/// Service for managing vouchers.
///
/// Canonicalization and balancing are responsibilities of this layer, not of
/// storage: every voucher reaches the repository with its plug leg resolved
/// and its details in canonical order, so structurally-equal vouchers compare
/// equal wherever they are read back.
pub struct VoucherService {
    repository: Arc<dyn VoucherRepositoryTrait>,
}

impl VoucherService {
    pub fn new(repository: Arc<dyn VoucherRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl VoucherServiceTrait for VoucherService {
    fn get_voucher(&self, id: &str) -> Result<Option<Voucher>> {
        self.repository.get(id)
    }

    fn select_vouchers(&self, query: &Query<VoucherQueryAtom>) -> Result<Vec<Voucher>> {
        self.repository.select(query)
    }

    async fn upsert_voucher(&self, mut voucher: Voucher) -> Result<Voucher> {
        debug!(
            "Upserting voucher id={:?} date={:?} details={}",
            voucher.id,
            voucher.date,
            voucher.details.len()
        );
        voucher.validate()?;
        voucher.balance()?;
        voucher.canonicalize();
        self.repository.upsert(voucher).await
    }

    async fn delete_voucher(&self, id: &str) -> Result<bool> {
        self.repository.delete(id).await
    }

    async fn delete_vouchers(&self, query: &Query<VoucherQueryAtom>) -> Result<usize> {
        self.repository.delete_by_query(query).await
    }

    fn subtotal(
        &self,
        query: &Query<VoucherQueryAtom>,
        details: &Query<DetailQueryAtom>,
        spec: &SubtotalSpec,
    ) -> Result<SubtotalNode> {
        let rows = self.repository.select_grouped(query, details)?;
        Ok(SubtotalBuilder::new(spec).build(rows))
    }
}
