use async_trait::async_trait;
use common::ProductId;

use crate::Result;

/// Shared key-to-integer store used for fast admission control of stock.
///
/// One key per product, value = currently available stock. The value is
/// never observed negative by any caller: a decrement that would go
/// negative is rejected, not clamped.
#[async_trait]
pub trait StockCounters: Send + Sync {
    /// Sets the counter unconditionally.
    ///
    /// Called when a product is registered with its initial quantity.
    /// Overwriting an existing key is allowed (re-seed semantics); no
    /// history is kept.
    async fn seed(&self, product_id: ProductId, quantity: i64) -> Result<()>;

    /// Atomically subtracts `amount` if the current value covers it.
    ///
    /// Returns the new value on success. Fails with
    /// [`StockError::InsufficientStock`] when `current < amount`, leaving
    /// the counter untouched. The check and the subtraction are one
    /// operation from the perspective of all concurrent callers: no two
    /// callers can both succeed when only one of them fits the remaining
    /// stock.
    ///
    /// [`StockError::InsufficientStock`]: crate::StockError::InsufficientStock
    async fn try_decrement(&self, product_id: ProductId, amount: i64) -> Result<i64>;

    /// Atomically adds `amount`, returning the new value.
    ///
    /// Used for compensation (order cancellation, rollback of a partially
    /// reserved placement). Has no failure mode other than the store
    /// being unavailable or the key never having been seeded.
    async fn increment(&self, product_id: ProductId, amount: i64) -> Result<i64>;

    /// Reads the current value.
    async fn get(&self, product_id: ProductId) -> Result<i64>;
}
