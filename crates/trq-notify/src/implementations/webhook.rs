//! HTTP webhook delivery for order notifications.
//!
//! Posts the CSV export to a configured recipient endpoint (typically an
//! inbound-mail bridge). The request number travels in headers so the
//! receiving side can thread notifications without parsing the body.

use crate::export::{export_filename, order_to_csv};
use crate::{NotifyError, OrderNotifier};
use async_trait::async_trait;
use trq_types::Order;

/// Notifier that delivers exports over HTTP POST.
pub struct WebhookNotifier {
	client: reqwest::Client,
	endpoint: String,
}

impl WebhookNotifier {
	pub fn new(endpoint: String) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
		}
	}
}

#[async_trait]
impl OrderNotifier for WebhookNotifier {
	async fn order_created(&self, order: &Order) -> Result<(), NotifyError> {
		let body = order_to_csv(order)?;
		let response = self
			.client
			.post(&self.endpoint)
			.header("content-type", "text/csv")
			.header("x-trq-request-number", &order.request_number)
			.header("x-trq-filename", export_filename(order))
			.body(body)
			.send()
			.await
			.map_err(|e| NotifyError::Delivery(e.to_string()))?;

		if !response.status().is_success() {
			return Err(NotifyError::Delivery(format!(
				"recipient endpoint returned {}",
				response.status()
			)));
		}
		tracing::info!(
			request_number = %order.request_number,
			"Delivered order notification"
		);
		Ok(())
	}
}
