use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::{Mutex, Notify};

use crate::{
    ChannelError, Result, StockChangeEvent,
    channel::{DeadLetter, Delivery, StockChannel},
};

struct QueuedMessage {
    payload: serde_json::Value,
    redelivered: bool,
}

#[derive(Default)]
struct ChannelState {
    queue: VecDeque<QueuedMessage>,
    dead_letters: Vec<DeadLetter>,
    /// Per-product high-water mark of stamped sequences.
    sequences: HashMap<ProductId, i64>,
    /// Tag of the delivery currently outstanding, if any.
    outstanding: Option<u64>,
    next_tag: u64,
}

/// In-process stock event channel.
///
/// FIFO order is preserved; the head message stays queued until acked, so
/// the consumer sees it again (flagged `redelivered`) after a nack or an
/// unsettled receive. Sequence stamping and the enqueue happen under one
/// lock, which is what keeps sequence order equal to queue order per
/// product. Only the most recent delivery tag is valid; an older tag
/// fails with [`ChannelError::StaleDelivery`]. Stands in for a
/// broker-backed queue in tests and single-node deployments.
#[derive(Clone, Default)]
pub struct InMemoryStockChannel {
    state: Arc<Mutex<ChannelState>>,
    notify: Arc<Notify>,
}

impl InMemoryStockChannel {
    /// Creates a new empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a raw payload, bypassing sequence stamping.
    ///
    /// Lets tests exercise the consumer's redelivery and poison paths
    /// with payloads the regular publish cannot produce.
    pub async fn publish_raw(&self, payload: serde_json::Value) {
        let mut state = self.state.lock().await;
        state.queue.push_back(QueuedMessage {
            payload,
            redelivered: false,
        });
        drop(state);
        self.notify.notify_one();
    }

    fn settle(state: &mut ChannelState, tag: u64) -> Result<QueuedMessage> {
        if state.outstanding != Some(tag) {
            return Err(ChannelError::StaleDelivery { tag });
        }
        state.outstanding = None;
        // The outstanding delivery is always the head message.
        state
            .queue
            .pop_front()
            .ok_or(ChannelError::StaleDelivery { tag })
    }
}

#[async_trait]
impl StockChannel for InMemoryStockChannel {
    async fn publish(&self, product_id: ProductId, delta: i64) -> Result<()> {
        let mut state = self.state.lock().await;

        let sequence = state.sequences.entry(product_id).or_insert(0);
        *sequence += 1;
        let event = StockChangeEvent {
            product_id,
            delta,
            sequence: *sequence,
        };

        let payload = serde_json::to_value(&event)?;
        state.queue.push_back(QueuedMessage {
            payload,
            redelivered: false,
        });
        drop(state);

        metrics::counter!("stock_events_published_total").increment(1);
        self.notify.notify_one();
        Ok(())
    }

    async fn receive(&self) -> Result<Delivery> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(message) = state.queue.front() {
                    let redelivered = message.redelivered || state.outstanding.is_some();
                    let payload = message.payload.clone();
                    state.next_tag += 1;
                    let tag = state.next_tag;
                    state.outstanding = Some(tag);
                    return Ok(Delivery {
                        payload,
                        tag,
                        redelivered,
                    });
                }
            }
            notified.await;
        }
    }

    async fn ack(&self, tag: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::settle(&mut state, tag)?;
        Ok(())
    }

    async fn nack(&self, tag: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.outstanding != Some(tag) {
            return Err(ChannelError::StaleDelivery { tag });
        }
        state.outstanding = None;
        if let Some(message) = state.queue.front_mut() {
            message.redelivered = true;
        }
        drop(state);
        self.notify.notify_one();
        Ok(())
    }

    async fn reject(&self, tag: u64, reason: String) -> Result<()> {
        let mut state = self.state.lock().await;
        let message = Self::settle(&mut state, tag)?;
        tracing::warn!(%reason, "message dead-lettered");
        metrics::counter!("stock_events_dead_lettered_total").increment(1);
        state.dead_letters.push(DeadLetter {
            payload: message.payload,
            reason,
        });
        Ok(())
    }

    async fn dead_letters(&self) -> Result<Vec<DeadLetter>> {
        Ok(self.state.lock().await.dead_letters.clone())
    }

    async fn depth(&self) -> Result<usize> {
        Ok(self.state.lock().await.queue.len())
    }
}
