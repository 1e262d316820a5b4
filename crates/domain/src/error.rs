use common::{MemberId, OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur in the domain layer.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The member does not exist (or was soft-deleted).
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// A member with this email already exists.
    #[error("Member email already registered: {0}")]
    DuplicateEmail(String),

    /// The product does not exist in the authoritative store.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order was already canceled; the transition cannot repeat.
    #[error("Order already canceled: {0}")]
    AlreadyCanceled(OrderId),

    /// An order line quantity must be positive.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// An order must carry at least one line.
    #[error("Order has no lines")]
    EmptyOrder,

    /// A stored enum column holds a value this build does not know.
    #[error("Invalid stored value for {column}: {value}")]
    InvalidColumn { column: &'static str, value: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
