use std::sync::Arc;
use std::time::Duration;

use channel::{Delivery, StockChangeEvent, StockChannel};
use domain::{DomainError, ProductRepository, StockApply};

use crate::Result;

/// Applies stock-change events to the authoritative product records.
///
/// Exactly one logical worker drains the queue: [`run`] consumes the
/// reconciler, so a second worker cannot share the loop. Serialized
/// consumption rules out concurrent writes against the authoritative
/// store; one worker per queue is a hard operational invariant.
///
/// Each event is applied inside its own transaction, conditionally on
/// its sequence exceeding the product's high-water mark; redeliveries
/// are skipped instead of double-applied. An event whose product does
/// not exist is a poison message and is diverted to the dead-letter
/// queue rather than retried forever.
///
/// [`run`]: Reconciler::run
pub struct Reconciler {
    products: Arc<dyn ProductRepository>,
    channel: Arc<dyn StockChannel>,
    retry_delay: Duration,
}

impl Reconciler {
    /// Creates a reconciler over the given store and channel.
    pub fn new(products: Arc<dyn ProductRepository>, channel: Arc<dyn StockChannel>) -> Self {
        Self {
            products,
            channel,
            retry_delay: Duration::from_millis(100),
        }
    }

    /// Overrides the delay between retries of transient failures.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Drains the channel until the task is aborted.
    #[tracing::instrument(skip(self))]
    pub async fn run(self) {
        tracing::info!("reconciler started");
        loop {
            match self.channel.receive().await {
                Ok(delivery) => self.handle(delivery).await,
                Err(e) => {
                    tracing::error!(error = %e, "failed to receive from channel");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Processes queued events until the queue is momentarily empty.
    ///
    /// Returns the number of deliveries handled.
    pub async fn drain(&self) -> Result<usize> {
        let mut handled = 0;
        while self.channel.depth().await? > 0 {
            let delivery = self.channel.receive().await?;
            self.handle(delivery).await;
            handled += 1;
        }
        Ok(handled)
    }

    async fn handle(&self, delivery: Delivery) {
        let event: StockChangeEvent = match serde_json::from_value(delivery.payload.clone()) {
            Ok(event) => event,
            Err(e) => {
                self.settle(
                    self.channel
                        .reject(delivery.tag, format!("malformed payload: {e}"))
                        .await,
                );
                return;
            }
        };

        match self
            .products
            .apply_stock_delta(event.product_id, event.delta, event.sequence)
            .await
        {
            Ok(StockApply::Applied { new_quantity }) => {
                metrics::counter!("stock_events_applied_total").increment(1);
                tracing::debug!(
                    product_id = %event.product_id,
                    delta = event.delta,
                    new_quantity,
                    "stock change applied"
                );
                self.settle(self.channel.ack(delivery.tag).await);
            }
            Ok(StockApply::Skipped { applied_sequence }) => {
                metrics::counter!("stock_events_skipped_total").increment(1);
                tracing::info!(
                    product_id = %event.product_id,
                    sequence = event.sequence,
                    applied_sequence,
                    redelivered = delivery.redelivered,
                    "stale stock change skipped"
                );
                self.settle(self.channel.ack(delivery.tag).await);
            }
            Err(DomainError::ProductNotFound(product_id)) => {
                self.settle(
                    self.channel
                        .reject(delivery.tag, format!("product {product_id} not found"))
                        .await,
                );
            }
            Err(e) => {
                // Transient store failure: leave the message for
                // redelivery and back off.
                tracing::warn!(
                    product_id = %event.product_id,
                    error = %e,
                    "stock change apply failed, will retry"
                );
                self.settle(self.channel.nack(delivery.tag).await);
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }

    fn settle(&self, result: channel::Result<()>) {
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to settle delivery");
        }
    }
}
