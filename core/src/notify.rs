// storefront-core/src/notify.rs

use crate::model::Order;
use crate::ports::Notifier;
use async_trait::async_trait;
use tracing::info;

/// Default notifier: records each notification as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
  async fn payment_confirmed(&self, order: &Order) {
    info!(
      notification = "payment_confirmed",
      order_id = %order.id,
      order_number = %order.order_number,
      customer_email = %order.customer_email,
      total = order.total,
      "Payment confirmation notification queued."
    );
  }

  async fn payment_failed(&self, order: &Order) {
    info!(
      notification = "payment_failed",
      order_id = %order.id,
      order_number = %order.order_number,
      customer_email = %order.customer_email,
      "Payment failure notification queued."
    );
  }

  async fn order_cancelled(&self, order: &Order) {
    info!(
      notification = "order_cancelled",
      order_id = %order.id,
      order_number = %order.order_number,
      customer_email = %order.customer_email,
      "Order cancellation notification queued."
    );
  }
}
