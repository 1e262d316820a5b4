use chrono::{DateTime, Utc};
use common::{MemberId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::{DomainError, Result};

/// Lifecycle status of an order.
///
/// The only transition is `Placed` to `Canceled`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Placed,
    Canceled,
}

impl OrderStatus {
    /// Returns the status name as stored and served.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLACED" => Some(OrderStatus::Placed),
            "CANCELED" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of an order: a product and a positive quantity.
///
/// Owned exclusively by its order; never shared or reused across orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderLine {
    /// Creates a line, rejecting non-positive quantities.
    pub fn new(product_id: ProductId, quantity: i64) -> Result<Self> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity {
                product_id,
                quantity,
            });
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

/// Order aggregate root.
///
/// Assembled fully in memory with all its lines before persistence;
/// the repository stores the aggregate in a single transaction. The line
/// list is immutable after creation; cancellation only flips the
/// status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub member_id: MemberId,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Assembles a new placed order with its full line list.
    pub fn place(member_id: MemberId, lines: Vec<OrderLine>) -> Result<Self> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        Ok(Self {
            id: OrderId::new(),
            member_id,
            status: OrderStatus::Placed,
            lines,
            placed_at: Utc::now(),
        })
    }

    /// Flips the order to canceled.
    ///
    /// Canceling an already-canceled order is a state error, which is
    /// what keeps compensation from running twice.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status == OrderStatus::Canceled {
            return Err(DomainError::AlreadyCanceled(self.id));
        }
        self.status = OrderStatus::Canceled;
        Ok(())
    }
}
