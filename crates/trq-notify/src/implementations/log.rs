//! Log-only notification sink for development and tests.

use crate::{NotifyError, OrderNotifier};
use async_trait::async_trait;
use trq_types::Order;

/// Notifier that records the event in the log and delivers nowhere.
#[derive(Default)]
pub struct LogNotifier;

impl LogNotifier {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl OrderNotifier for LogNotifier {
	async fn order_created(&self, order: &Order) -> Result<(), NotifyError> {
		tracing::info!(
			request_number = %order.request_number,
			vehicles = order.vehicles.len(),
			"New transport request (notification delivery disabled)"
		);
		Ok(())
	}
}
