//! Core order-lifecycle engine for the TRQ service.
//!
//! This crate holds the only real domain logic in the system: the order
//! status state machine, the capability checks deciding who may drive each
//! transition, the disjoint dashboard partitioning, and request-number
//! allocation. Everything around it (HTTP, export, VIN decode, payment
//! sessions) is peripheral glue behind the collaborator traits.

use thiserror::Error;
use trq_storage::StorageError;
use trq_types::OrderStatus;

pub mod authz;
pub mod dashboard;
pub mod engine;
pub mod sequence;

pub use authz::{authorize, Action};
pub use dashboard::{
	admin_bucket, AdminBucket, AdminDashboard, CustomerDashboard, DashboardRouter, Page,
};
pub use engine::{parse_price, DeclineDecision, TransitionEngine};

/// Errors surfaced by the core engine and guard.
///
/// On any error, no state has been mutated; a partial write is never
/// visible to a later reader.
#[derive(Debug, Error)]
pub enum CoreError {
	/// The referenced order or user does not exist.
	#[error("Not found")]
	NotFound,
	/// The actor lacks the capability or does not own the order. Distinct
	/// from `NotFound` so a caller can tell a missing order from someone
	/// else's.
	#[error("Unauthorized")]
	Unauthorized,
	/// A supplied value failed validation.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// The requested action is not legal from the order's current status.
	#[error("{action} is not allowed from status {from}")]
	InvalidTransition {
		from: OrderStatus,
		action: Action,
	},
	/// A concurrent mutation won the race; the caller may retry against
	/// fresh state.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// A storage or invariant failure that is not the caller's fault.
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<StorageError> for CoreError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => CoreError::NotFound,
			StorageError::Conflict(msg) => CoreError::Conflict(msg),
			other => CoreError::Internal(other.to_string()),
		}
	}
}
