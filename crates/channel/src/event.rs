use common::ProductId;
use serde::{Deserialize, Serialize};

/// Stock delta to apply to the authoritative product record.
///
/// Transient: exists only on the wire between the orchestrator and the
/// reconciliation consumer. The sign of `delta` encodes the direction:
/// negative for a reservation, positive for a compensation. `sequence`
/// is the per-product monotonic number stamped by the channel at
/// enqueue time; the consumer applies an event only when its sequence is
/// above the product's high-water mark, which makes redelivery safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChangeEvent {
    pub product_id: ProductId,
    pub delta: i64,
    pub sequence: i64,
}
