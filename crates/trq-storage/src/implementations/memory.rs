//! In-memory storage backend for the TRQ service.
//!
//! This module provides memory-based implementations of the order and user
//! store traits, useful for testing and development scenarios where
//! persistence is not required. Uniqueness and version checks run under a
//! single write lock, so the atomicity guarantees of the traits hold.

use crate::{OrderFilter, OrderStore, StorageError, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use trq_types::{parse_request_number, Order, User};

/// In-memory order store.
pub struct MemoryOrderStore {
	/// Orders by id, with a request-number index, behind one lock so that
	/// insert can check both uniqueness constraints atomically.
	inner: Arc<RwLock<OrderMaps>>,
}

#[derive(Default)]
struct OrderMaps {
	by_id: HashMap<String, Order>,
	id_by_number: HashMap<String, String>,
}

impl MemoryOrderStore {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(RwLock::new(OrderMaps::default())),
		}
	}
}

impl Default for MemoryOrderStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
	async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StorageError> {
		let maps = self.inner.read().await;
		Ok(maps.by_id.get(id).cloned())
	}

	async fn find_by_number(&self, number: &str) -> Result<Option<Order>, StorageError> {
		let maps = self.inner.read().await;
		Ok(maps
			.id_by_number
			.get(number)
			.and_then(|id| maps.by_id.get(id))
			.cloned())
	}

	async fn find_latest(&self) -> Result<Option<Order>, StorageError> {
		let maps = self.inner.read().await;
		Ok(maps
			.by_id
			.values()
			.max_by_key(|o| {
				(
					o.created_at,
					parse_request_number(&o.request_number).unwrap_or(0),
				)
			})
			.cloned())
	}

	async fn insert(&self, order: Order) -> Result<(), StorageError> {
		let mut maps = self.inner.write().await;
		if maps.by_id.contains_key(&order.id) {
			return Err(StorageError::Conflict(format!(
				"duplicate order id {}",
				order.id
			)));
		}
		if maps.id_by_number.contains_key(&order.request_number) {
			return Err(StorageError::Conflict(format!(
				"duplicate request number {}",
				order.request_number
			)));
		}
		maps.id_by_number
			.insert(order.request_number.clone(), order.id.clone());
		maps.by_id.insert(order.id.clone(), order);
		Ok(())
	}

	async fn update(&self, mut order: Order, expected_version: u64) -> Result<Order, StorageError> {
		let mut maps = self.inner.write().await;
		let stored = maps.by_id.get(&order.id).ok_or(StorageError::NotFound)?;
		if stored.version != expected_version {
			return Err(StorageError::Conflict(format!(
				"version mismatch on {}: stored {}, expected {}",
				order.id, stored.version, expected_version
			)));
		}
		order.version = expected_version + 1;
		order.updated_at = Utc::now();
		maps.by_id.insert(order.id.clone(), order.clone());
		Ok(order)
	}

	async fn query(
		&self,
		filter: &OrderFilter,
		skip: usize,
		limit: usize,
	) -> Result<(Vec<Order>, u64), StorageError> {
		let maps = self.inner.read().await;
		let mut matched: Vec<&Order> = maps.by_id.values().filter(|o| filter.matches(o)).collect();
		// Newest first, request number as a stable tiebreak
		matched.sort_by(|a, b| {
			b.created_at.cmp(&a.created_at).then_with(|| {
				parse_request_number(&b.request_number)
					.unwrap_or(0)
					.cmp(&parse_request_number(&a.request_number).unwrap_or(0))
			})
		});
		let total = matched.len() as u64;
		let page = matched
			.into_iter()
			.skip(skip)
			.take(limit)
			.cloned()
			.collect();
		Ok((page, total))
	}
}

/// In-memory user store.
pub struct MemoryUserStore {
	inner: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryUserStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl UserStore for MemoryUserStore {
	async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
		let users = self.inner.read().await;
		Ok(users.get(id).cloned())
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
		let users = self.inner.read().await;
		Ok(users.values().find(|u| u.email == email).cloned())
	}

	async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, StorageError> {
		let users = self.inner.read().await;
		Ok(users
			.values()
			.find(|u| u.reset_token.as_deref() == Some(token))
			.cloned())
	}

	async fn insert(&self, user: User) -> Result<(), StorageError> {
		let mut users = self.inner.write().await;
		if users.values().any(|u| u.email == user.email) {
			return Err(StorageError::Conflict(format!(
				"email already registered: {}",
				user.email
			)));
		}
		users.insert(user.id.clone(), user);
		Ok(())
	}

	async fn update(&self, user: User) -> Result<(), StorageError> {
		let mut users = self.inner.write().await;
		if !users.contains_key(&user.id) {
			return Err(StorageError::NotFound);
		}
		users.insert(user.id.clone(), user);
		Ok(())
	}
}
