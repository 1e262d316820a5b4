use async_trait::async_trait;
use common::ProductId;

use crate::Result;

/// A message handed to the consumer.
///
/// The payload is the raw wire value; deserialization is the consumer's
/// responsibility so that a malformed payload can be settled as a poison
/// message instead of wedging the queue.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub payload: serde_json::Value,
    /// Tag identifying this delivery for ack/nack/reject.
    pub tag: u64,
    /// True when this message has been delivered before.
    pub redelivered: bool,
}

/// A message diverted off the queue after being rejected.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub payload: serde_json::Value,
    pub reason: String,
}

/// Durable, ordered, at-least-once transport for stock-change events.
///
/// One logical queue, one concurrent publisher population, one serialized
/// consumer. Publishing is fire-and-forget from the orchestrator's
/// perspective once acknowledged. A delivered message is not removed
/// until it is acked; receiving again before settling redelivers the same
/// message with a fresh tag and the `redelivered` flag set.
#[async_trait]
pub trait StockChannel: Send + Sync {
    /// Appends a stock delta to the queue.
    ///
    /// The channel stamps the event with the product's next sequence
    /// number as part of the enqueue, so sequence order always matches
    /// queue order per product. Must be called only after the
    /// corresponding reservation succeeded, never speculatively.
    async fn publish(&self, product_id: ProductId, delta: i64) -> Result<()>;

    /// Waits for the next message and returns it without removing it.
    async fn receive(&self) -> Result<Delivery>;

    /// Settles a delivery, removing the message from the queue.
    async fn ack(&self, tag: u64) -> Result<()>;

    /// Returns a delivery for redelivery after a transient failure.
    async fn nack(&self, tag: u64) -> Result<()>;

    /// Diverts a poison message to the dead-letter queue.
    async fn reject(&self, tag: u64, reason: String) -> Result<()>;

    /// Messages diverted so far, oldest first.
    async fn dead_letters(&self) -> Result<Vec<DeadLetter>>;

    /// Number of messages currently queued (excluding dead letters).
    async fn depth(&self) -> Result<usize>;
}
