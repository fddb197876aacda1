//! Storage module for the TRQ service.
//!
//! This module provides abstractions for persistent storage of orders and
//! users, supporting different backend implementations. The reference
//! backend is in-memory; production deployments supply a database-backed
//! implementation of the same traits.
//!
//! Order updates are version-conditional: every write carries the version
//! the caller read, and a mismatch fails with [`StorageError::Conflict`]
//! rather than silently overwriting a concurrent mutation.

use async_trait::async_trait;
use thiserror::Error;
use trq_types::{Order, OrderStatus, User, UserId};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a write loses a uniqueness or version race.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Owner predicate for order queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OwnerFilter {
	/// Any owner, claimed or not.
	#[default]
	Any,
	/// Unclaimed orders only.
	Unset,
	/// Claimed orders, regardless of which admin holds them.
	Set,
	/// Orders claimed by one specific admin.
	Exactly(UserId),
}

/// Filter for order queries. All populated fields must match.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
	/// Restrict to orders created by this user.
	pub requester: Option<UserId>,
	/// Restrict by claim state.
	pub owner: OwnerFilter,
	/// Restrict to these statuses.
	pub statuses: Option<Vec<OrderStatus>>,
	/// Exclude these statuses.
	pub exclude_statuses: Option<Vec<OrderStatus>>,
	/// Restrict by payment state.
	pub is_paid: Option<bool>,
	/// Exclude anything matching this sub-filter. Lets callers carve one
	/// partition out of another while keeping both as plain queries.
	pub exclude: Option<Box<OrderFilter>>,
}

impl OrderFilter {
	/// Whether a single order satisfies this filter.
	pub fn matches(&self, order: &Order) -> bool {
		if let Some(requester) = &self.requester {
			if &order.requester != requester {
				return false;
			}
		}
		match &self.owner {
			OwnerFilter::Any => {}
			OwnerFilter::Unset => {
				if order.owner.is_some() {
					return false;
				}
			}
			OwnerFilter::Set => {
				if order.owner.is_none() {
					return false;
				}
			}
			OwnerFilter::Exactly(id) => {
				if order.owner.as_ref() != Some(id) {
					return false;
				}
			}
		}
		if let Some(statuses) = &self.statuses {
			if !statuses.contains(&order.status) {
				return false;
			}
		}
		if let Some(excluded) = &self.exclude_statuses {
			if excluded.contains(&order.status) {
				return false;
			}
		}
		if let Some(is_paid) = self.is_paid {
			if order.is_paid != is_paid {
				return false;
			}
		}
		if let Some(excluded) = &self.exclude {
			if excluded.matches(order) {
				return false;
			}
		}
		true
	}
}

/// Trait defining the persistent store for orders.
///
/// Implementations must enforce uniqueness of both the order id and the
/// request number on insert, and compare-and-swap semantics on update.
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Looks up an order by its opaque id.
	async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StorageError>;

	/// Looks up an order by its request number (`TRQ_<n>`).
	async fn find_by_number(&self, number: &str) -> Result<Option<Order>, StorageError>;

	/// Returns the most recently created order, if any.
	///
	/// Ties on `created_at` break toward the larger request-number suffix so
	/// sequence allocation never walks backwards.
	async fn find_latest(&self) -> Result<Option<Order>, StorageError>;

	/// Inserts a new order.
	///
	/// Fails with [`StorageError::Conflict`] if the id or the request number
	/// is already taken. The uniqueness check and the insert are atomic.
	async fn insert(&self, order: Order) -> Result<(), StorageError>;

	/// Conditionally updates an existing order.
	///
	/// The write applies only if the stored version equals
	/// `expected_version`; otherwise the caller lost a race and receives
	/// [`StorageError::Conflict`] with nothing written. On success the
	/// stored order has its version bumped and `updated_at` refreshed, and
	/// is returned.
	async fn update(&self, order: Order, expected_version: u64) -> Result<Order, StorageError>;

	/// Queries orders matching `filter`, newest first.
	///
	/// Returns the requested page and the total match count (before
	/// skip/limit), for pagination.
	async fn query(
		&self,
		filter: &OrderFilter,
		skip: usize,
		limit: usize,
	) -> Result<(Vec<Order>, u64), StorageError>;
}

/// Trait defining the persistent store for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
	/// Looks up a user by id.
	async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError>;

	/// Looks up a user by login email.
	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

	/// Looks up a user holding the given password-reset token.
	async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StorageError>;

	/// Inserts a new user.
	///
	/// Fails with [`StorageError::Conflict`] if the email is already
	/// registered.
	async fn insert(&self, user: User) -> Result<(), StorageError>;

	/// Overwrites an existing user record.
	async fn update(&self, user: User) -> Result<(), StorageError>;
}
