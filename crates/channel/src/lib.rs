//! Stock-change event channel.
//!
//! A single logical queue carries [`StockChangeEvent`] payloads from the
//! ordering orchestrator to the reconciliation consumer. The channel is
//! ordered and at-least-once: a delivered message stays at the head of
//! the queue until it is acked, so a consumer failure between receive and
//! ack redelivers it. Exactly one logical consumer drains the queue; that
//! topology is what keeps reconciliation serialized.
//!
//! Each event is stamped with a per-product monotonic sequence at
//! enqueue time, under the same ordering as the queue itself, so the
//! consumer always observes nondecreasing sequences per product. The
//! sequence is the consumer's redelivery guard.

mod channel;
mod error;
mod event;
mod memory;

pub use channel::{DeadLetter, Delivery, StockChannel};
pub use error::{ChannelError, Result};
pub use event::StockChangeEvent;
pub use memory::InMemoryStockChannel;
