use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::{Result, StockCounters, StockError};

/// In-process stock counter store.
///
/// Holds every counter behind a single lock, so the compare-and-subtract
/// in [`try_decrement`] is atomic for all callers. Stands in for a
/// process-external store in tests and single-node deployments; the
/// [`StockCounters`] trait is the seam for a networked implementation.
///
/// [`try_decrement`]: StockCounters::try_decrement
#[derive(Clone, Default)]
pub struct InMemoryStockCounters {
    counters: Arc<RwLock<HashMap<ProductId, i64>>>,
}

impl InMemoryStockCounters {
    /// Creates a new empty counter store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of seeded counters.
    pub async fn len(&self) -> usize {
        self.counters.read().await.len()
    }

    /// Returns true if no counter has been seeded.
    pub async fn is_empty(&self) -> bool {
        self.counters.read().await.is_empty()
    }
}

#[async_trait]
impl StockCounters for InMemoryStockCounters {
    async fn seed(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        self.counters.write().await.insert(product_id, quantity);
        Ok(())
    }

    async fn try_decrement(&self, product_id: ProductId, amount: i64) -> Result<i64> {
        let mut counters = self.counters.write().await;
        let current = counters
            .get_mut(&product_id)
            .ok_or(StockError::CounterNotFound(product_id))?;

        if *current < amount {
            metrics::counter!("stock_decrement_rejected_total").increment(1);
            return Err(StockError::InsufficientStock {
                product_id,
                requested: amount,
                available: *current,
            });
        }

        *current -= amount;
        Ok(*current)
    }

    async fn increment(&self, product_id: ProductId, amount: i64) -> Result<i64> {
        let mut counters = self.counters.write().await;
        let current = counters
            .get_mut(&product_id)
            .ok_or(StockError::CounterNotFound(product_id))?;
        *current += amount;
        Ok(*current)
    }

    async fn get(&self, product_id: ProductId) -> Result<i64> {
        self.counters
            .read()
            .await
            .get(&product_id)
            .copied()
            .ok_or(StockError::CounterNotFound(product_id))
    }
}
