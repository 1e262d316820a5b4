use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};

/// A catalog product with its authoritative stock quantity.
///
/// `stock_quantity` is eventually consistent with the stock counter: it
/// trails the counter by whatever stock-change events are still in
/// flight. `applied_sequence` is the high-water mark of reconciliation
/// sequences already applied, the guard that makes redelivered events
/// no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub applied_sequence: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for registering a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
}

impl Product {
    /// Creates a product from registration input.
    pub fn register(new: NewProduct) -> Self {
        Self {
            id: ProductId::new(),
            name: new.name,
            category: new.category,
            price_cents: new.price_cents,
            stock_quantity: new.stock_quantity,
            applied_sequence: 0,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of applying a stock-change event to the authoritative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockApply {
    /// The delta was applied; the record now holds `new_quantity`.
    Applied { new_quantity: i64 },
    /// The event's sequence was at or below the stored high-water mark;
    /// the record was left untouched (redelivery).
    Skipped { applied_sequence: i64 },
}
