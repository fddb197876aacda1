//! Order-created notification module for the TRQ service.
//!
//! When a new transport request lands, a tabular export of it (order header
//! fields plus one row per vehicle) is produced and delivered to a
//! configured recipient. Delivery is fire-and-forget from the core's point
//! of view: a failed notification is logged and never rolls back the order.

use async_trait::async_trait;
use thiserror::Error;
use trq_types::Order;

pub mod export;

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod webhook;
}

/// Errors that can occur while exporting or delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs while building the tabular export.
	#[error("Export error: {0}")]
	Export(String),
	/// Error that occurs while delivering to the recipient.
	#[error("Delivery error: {0}")]
	Delivery(String),
}

/// Trait defining the order-created notification collaborator.
///
/// Callers treat this as best-effort: implementations report failures
/// through the error so the caller can log them, but the surrounding order
/// mutation has already committed by the time this runs.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
	/// Exports and delivers a freshly created order.
	async fn order_created(&self, order: &Order) -> Result<(), NotifyError>;
}
