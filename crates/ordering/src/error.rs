use channel::ChannelError;
use common::{MemberId, OrderId, ProductId};
use domain::DomainError;
use stock::StockError;
use thiserror::Error;

/// Errors surfaced by order placement and cancellation.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The requesting member does not exist.
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// A line references a product that does not exist (or was never
    /// seeded in the counter store).
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A line asked for more than the available stock. Business
    /// rejection; nothing was reserved when this is returned.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// The order was already canceled.
    #[error("Order already canceled: {0}")]
    AlreadyCanceled(OrderId),

    /// A line carried an invalid quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// The order carried no lines.
    #[error("Order has no lines")]
    EmptyOrder,

    /// The counter store or broker could not be reached. Transient; the
    /// whole placement attempt may be retried.
    #[error("Infrastructure unavailable: {0}")]
    Unavailable(String),

    /// Authoritative store failure.
    #[error("Repository error: {0}")]
    Repository(DomainError),
}

impl From<StockError> for OrderingError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::CounterNotFound(product_id) => OrderingError::ProductNotFound(product_id),
            StockError::InsufficientStock {
                product_id,
                requested,
                available,
            } => OrderingError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StockError::Unavailable(msg) => OrderingError::Unavailable(msg),
        }
    }
}

impl From<ChannelError> for OrderingError {
    fn from(e: ChannelError) -> Self {
        OrderingError::Unavailable(e.to_string())
    }
}

impl From<DomainError> for OrderingError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::MemberNotFound(id) => OrderingError::MemberNotFound(id),
            DomainError::ProductNotFound(id) => OrderingError::ProductNotFound(id),
            DomainError::OrderNotFound(id) => OrderingError::OrderNotFound(id),
            DomainError::AlreadyCanceled(id) => OrderingError::AlreadyCanceled(id),
            DomainError::InvalidQuantity {
                product_id,
                quantity,
            } => OrderingError::InvalidQuantity {
                product_id,
                quantity,
            },
            DomainError::EmptyOrder => OrderingError::EmptyOrder,
            other => OrderingError::Repository(other),
        }
    }
}

/// Result type for ordering operations.
pub type Result<T> = std::result::Result<T, OrderingError>;
