use std::sync::Arc;

use channel::StockChannel;
use common::{Identity, MemberId, OrderId, ProductId};
use domain::{MemberRepository, Order, OrderLine, OrderRepository, ProductRepository};
use stock::StockCounters;

use crate::{OrderingError, Result};

/// Orchestrates order placement against the stock counter store.
///
/// Reservation order: for each line, in request order, the counter is
/// atomically decremented. Counter decrements are provisional
/// reservations; when a later line fails or the order cannot be
/// persisted, every reservation taken by the same call is released
/// before the error is surfaced. Once the order is durable, one
/// stock-change event per line is published for the reconciler.
///
/// No application-level lock is held across the reservation loop; the
/// counter store's atomic primitives are the only synchronization point
/// between concurrent placements.
pub struct OrderingService {
    members: Arc<dyn MemberRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    counters: Arc<dyn StockCounters>,
    channel: Arc<dyn StockChannel>,
}

impl OrderingService {
    /// Creates a new ordering service over the given backends.
    pub fn new(
        members: Arc<dyn MemberRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        counters: Arc<dyn StockCounters>,
        channel: Arc<dyn StockChannel>,
    ) -> Self {
        Self {
            members,
            products,
            orders,
            counters,
            channel,
        }
    }

    /// Places an order for the authenticated member.
    ///
    /// Returns the new order id, or an error with every reservation of
    /// this call released.
    #[tracing::instrument(skip(self, lines), fields(member_id = %identity.member_id))]
    pub async fn place_order(&self, identity: &Identity, lines: Vec<OrderLine>) -> Result<OrderId> {
        let start = std::time::Instant::now();

        let member = self
            .members
            .find_by_id(identity.member_id)
            .await?
            .ok_or(OrderingError::MemberNotFound(identity.member_id))?;

        let mut reserved: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            if self.products.find_by_id(line.product_id).await?.is_none() {
                self.release(&reserved).await;
                return Err(OrderingError::ProductNotFound(line.product_id));
            }

            match self
                .counters
                .try_decrement(line.product_id, line.quantity)
                .await
            {
                Ok(_) => reserved.push(line.clone()),
                Err(e) => {
                    self.release(&reserved).await;
                    metrics::counter!("orders_rejected_total").increment(1);
                    return Err(e.into());
                }
            }
        }

        let order = Order::place(member.id, lines)?;
        let order_id = order.id;
        if let Err(e) = self.orders.insert(&order).await {
            self.release(&order.lines).await;
            return Err(e.into());
        }

        // The order is durable; emit one reconciliation event per line.
        for line in &order.lines {
            self.publish_best_effort(line.product_id, -line.quantity).await;
        }

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("orders_placement_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(%order_id, "order placed");
        Ok(order_id)
    }

    /// Cancels a placed order, restoring its stock.
    ///
    /// The status flip is guarded by the aggregate: a second cancel is a
    /// state error and compensation does not run again.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<()> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderingError::OrderNotFound(order_id))?;

        order.cancel()?;
        self.orders.update_status(order.id, order.status).await?;

        for line in &order.lines {
            if let Err(e) = self
                .counters
                .increment(line.product_id, line.quantity)
                .await
            {
                tracing::error!(
                    product_id = %line.product_id,
                    error = %e,
                    "failed to restore counter on cancellation"
                );
            }
            self.publish_best_effort(line.product_id, line.quantity).await;
        }

        metrics::counter!("orders_canceled_total").increment(1);
        tracing::info!(%order_id, "order canceled");
        Ok(())
    }

    /// All committed orders, oldest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.orders.list().await?)
    }

    /// Committed orders owned by one member.
    pub async fn orders_for_member(&self, member_id: MemberId) -> Result<Vec<Order>> {
        Ok(self.orders.list_by_member(member_id).await?)
    }

    /// Loads a single order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderingError::OrderNotFound(order_id))
    }

    /// Releases reservations taken earlier in this call.
    async fn release(&self, reserved: &[OrderLine]) {
        for line in reserved {
            if let Err(e) = self
                .counters
                .increment(line.product_id, line.quantity)
                .await
            {
                tracing::error!(
                    product_id = %line.product_id,
                    error = %e,
                    "failed to release reservation"
                );
            }
        }
    }

    /// Publish is fire-and-forget: the order is already durable, so a
    /// broker failure is logged and counted, never unwound.
    async fn publish_best_effort(&self, product_id: ProductId, delta: i64) {
        if let Err(e) = self.channel.publish(product_id, delta).await {
            metrics::counter!("stock_publish_failures_total").increment(1);
            tracing::warn!(
                %product_id,
                delta,
                error = %e,
                "failed to publish stock change"
            );
        }
    }
}
