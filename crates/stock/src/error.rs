use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the stock counter store.
#[derive(Debug, Error)]
pub enum StockError {
    /// No counter was ever seeded for this product.
    #[error("No stock counter for product {0}")]
    CounterNotFound(ProductId),

    /// The decrement would take the counter below zero. The counter is
    /// left untouched. This is a business rejection, not a system fault.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The store could not be reached. Transient; callers may retry.
    #[error("Stock counter store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for stock counter operations.
pub type Result<T> = std::result::Result<T, StockError>;
