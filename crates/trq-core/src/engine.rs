//! Order transition engine.
//!
//! Validates and applies every state change an order can undergo. Each
//! mutating operation authorizes the actor through the guard, re-fetches
//! the order immediately before mutating, checks the requested transition
//! against a closed legality table, and persists through a
//! version-conditional update. A concurrent writer that got there first
//! surfaces as `Conflict`; nothing is ever silently overwritten.

use crate::authz::{authorize, Action};
use crate::{sequence, CoreError};
use chrono::Utc;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use trq_notify::OrderNotifier;
use trq_storage::{OrderStore, StorageError, UserStore};
use trq_types::{Actor, Order, OrderDraft, OrderStatus, Role, UserId};

/// How many times a create retries when request-number allocation races.
const CREATE_ATTEMPTS: usize = 3;

/// What a customer chose when declining a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineDecision {
	/// Close the order.
	Cancel,
	/// Send it back for a new quote; the caller then redirects to edit.
	Requote,
}

// Closed transition table: which source statuses each status-changing
// action accepts. Claim and Reassign are absent because they leave status
// untouched.
static ALLOWED_FROM: Lazy<HashMap<Action, HashSet<OrderStatus>>> = Lazy::new(|| {
	use OrderStatus::*;
	let mut m = HashMap::new();
	m.insert(Action::SetPrice, HashSet::from([Submitted, Quoted, Requote]));
	m.insert(Action::Requote, HashSet::from([Submitted, Quoted, Accepted]));
	m.insert(Action::AcceptQuote, HashSet::from([Quoted, Requote]));
	m.insert(Action::DeclineQuote, HashSet::from([Quoted, Requote]));
	m.insert(
		Action::EditAndResubmit,
		HashSet::from([Submitted, Quoted, Requote]),
	);
	m.insert(Action::PaymentSuccess, HashSet::from([Accepted]));
	m
});

/// Parses a customer- or admin-supplied price string.
///
/// Anything that is not a finite number strictly greater than zero fails
/// with `InvalidInput`.
pub fn parse_price(input: &str) -> Result<Decimal, CoreError> {
	let price: Decimal = input
		.trim()
		.parse()
		.map_err(|_| CoreError::InvalidInput(format!("price is not numeric: {input:?}")))?;
	validate_price(price)?;
	Ok(price)
}

fn validate_price(price: Decimal) -> Result<(), CoreError> {
	if price <= Decimal::ZERO {
		return Err(CoreError::InvalidInput(format!(
			"price must be positive, got {price}"
		)));
	}
	Ok(())
}

fn validate_draft(draft: &OrderDraft) -> Result<(), CoreError> {
	if draft.vehicles.is_empty() {
		return Err(CoreError::InvalidInput(
			"at least one vehicle is required".into(),
		));
	}
	for vehicle in &draft.vehicles {
		if vehicle.vin.trim().is_empty() {
			return Err(CoreError::InvalidInput("vehicle VIN is required".into()));
		}
	}
	for (label, stop) in [("pickup", &draft.pickup), ("delivery", &draft.delivery)] {
		if stop.contact.name.trim().is_empty() {
			return Err(CoreError::InvalidInput(format!(
				"{label} contact name is required"
			)));
		}
		if stop.contact.phone.trim().is_empty() {
			return Err(CoreError::InvalidInput(format!(
				"{label} contact phone is required"
			)));
		}
	}
	Ok(())
}

/// The transition engine: the single gateway to order mutation.
pub struct TransitionEngine {
	orders: Arc<dyn OrderStore>,
	users: Arc<dyn UserStore>,
	notifier: Arc<dyn OrderNotifier>,
}

impl TransitionEngine {
	pub fn new(
		orders: Arc<dyn OrderStore>,
		users: Arc<dyn UserStore>,
		notifier: Arc<dyn OrderNotifier>,
	) -> Self {
		Self {
			orders,
			users,
			notifier,
		}
	}

	/// Creates a new order in `Submitted`, allocating its request number.
	///
	/// Allocation races are resolved by the store's uniqueness constraint:
	/// on `Conflict` the engine re-reads and retries up to
	/// [`CREATE_ATTEMPTS`] times, then gives the conflict to the caller.
	/// The created-order notification is fire-and-forget; its failure is
	/// logged and never unwinds the create.
	pub async fn create(&self, actor: &Actor, draft: OrderDraft) -> Result<Order, CoreError> {
		authorize(actor, Action::Create, None)?;
		validate_draft(&draft)?;

		let mut last_conflict = String::new();
		for _ in 0..CREATE_ATTEMPTS {
			let request_number = sequence::next_request_number(self.orders.as_ref()).await?;
			let now = Utc::now();
			let order = Order {
				id: uuid::Uuid::new_v4().to_string(),
				request_number,
				requester: actor.id.clone(),
				owner: None,
				status: OrderStatus::Submitted,
				is_paid: false,
				price: None,
				company_name: draft.company_name.clone(),
				company_address: draft.company_address.clone(),
				pickup: draft.pickup.clone(),
				delivery: draft.delivery.clone(),
				vehicles: draft.vehicles.clone(),
				created_at: now,
				updated_at: now,
				version: 0,
			};
			match self.orders.insert(order.clone()).await {
				Ok(()) => {
					tracing::info!(
						request_number = %order.request_number,
						requester = %order.requester,
						"Created order"
					);
					self.spawn_notification(order.clone());
					return Ok(order);
				}
				Err(StorageError::Conflict(msg)) => {
					tracing::debug!(error = %msg, "Request number raced, retrying");
					last_conflict = msg;
				}
				Err(e) => return Err(e.into()),
			}
		}
		Err(CoreError::Conflict(last_conflict))
	}

	/// Prices an order, moving it to `Quoted`. Admin only.
	pub async fn set_price(
		&self,
		actor: &Actor,
		order_id: &str,
		price: Decimal,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::SetPrice, Some(&order))?;
		validate_price(price)?;
		require_status(&order, Action::SetPrice)?;

		let mut updated = order.clone();
		updated.price = Some(price);
		updated.status = OrderStatus::Quoted;
		let updated = self.persist(updated, order.version).await?;
		tracing::info!(
			request_number = %updated.request_number,
			%price,
			"Quoted order"
		);
		Ok(updated)
	}

	/// Sends an order back for a new quote. Admin only; blocked once paid.
	pub async fn requote(&self, actor: &Actor, order_id: &str) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::Requote, Some(&order))?;
		// The paid check belongs here, not in callers: a paid order must
		// never re-enter quoting regardless of how it is reached.
		if order.is_paid {
			return Err(CoreError::InvalidTransition {
				from: order.status,
				action: Action::Requote,
			});
		}
		require_status(&order, Action::Requote)?;

		let mut updated = order.clone();
		updated.status = OrderStatus::Requote;
		self.persist(updated, order.version).await
	}

	/// Claims an order for the acting admin. Status is untouched.
	///
	/// An order already claimed by someone else fails with `Conflict`
	/// unless `override_existing` is set. Two racing claims on an
	/// unclaimed order both pass the owner check, but the conditional
	/// update lets exactly one win; the loser gets `Conflict`.
	pub async fn claim(
		&self,
		actor: &Actor,
		order_id: &str,
		override_existing: bool,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::Claim, Some(&order))?;
		if let Some(existing) = &order.owner {
			if !override_existing {
				return Err(CoreError::Conflict(format!(
					"order {} is already claimed by {}",
					order.request_number, existing
				)));
			}
		}

		let mut updated = order.clone();
		updated.owner = Some(actor.id.clone());
		let updated = self.persist(updated, order.version).await?;
		tracing::info!(
			request_number = %updated.request_number,
			owner = %actor.id,
			"Claimed order"
		);
		Ok(updated)
	}

	/// Reassigns an order to another admin. Status is untouched.
	pub async fn reassign(
		&self,
		actor: &Actor,
		order_id: &str,
		new_owner: &UserId,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::Reassign, Some(&order))?;
		let target = self
			.users
			.find_by_id(new_owner)
			.await?
			.ok_or(CoreError::NotFound)?;
		if target.role != Role::Admin {
			return Err(CoreError::InvalidInput(format!(
				"{} is not an administrator",
				target.email
			)));
		}

		let mut updated = order.clone();
		updated.owner = Some(new_owner.clone());
		self.persist(updated, order.version).await
	}

	/// Accepts a quote on the requester's own order.
	///
	/// The order must actually carry a price: `Requote` is reachable
	/// straight from `Submitted`, so an order can sit in an acceptable
	/// status without a quote ever having been issued.
	pub async fn accept_quote(&self, actor: &Actor, order_id: &str) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::AcceptQuote, Some(&order))?;
		require_status(&order, Action::AcceptQuote)?;
		if order.price.is_none() {
			return Err(CoreError::InvalidTransition {
				from: order.status,
				action: Action::AcceptQuote,
			});
		}

		let mut updated = order.clone();
		updated.status = OrderStatus::Accepted;
		self.persist(updated, order.version).await
	}

	/// Declines a quote: either cancels the order outright or sends it
	/// back for re-quoting.
	pub async fn decline_quote(
		&self,
		actor: &Actor,
		order_id: &str,
		decision: DeclineDecision,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::DeclineQuote, Some(&order))?;
		require_status(&order, Action::DeclineQuote)?;

		let mut updated = order.clone();
		updated.status = match decision {
			DeclineDecision::Cancel => OrderStatus::Cancelled,
			DeclineDecision::Requote => OrderStatus::Requote,
		};
		self.persist(updated, order.version).await
	}

	/// Overwrites the mutable fields and resubmits the order for quoting.
	///
	/// A previously set price is kept; the resubmit puts the order back in
	/// front of admins for a fresh quote anyway.
	pub async fn edit_and_resubmit(
		&self,
		actor: &Actor,
		order_id: &str,
		draft: OrderDraft,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::EditAndResubmit, Some(&order))?;
		require_status(&order, Action::EditAndResubmit)?;
		validate_draft(&draft)?;

		let mut updated = order.clone();
		updated.company_name = draft.company_name;
		updated.company_address = draft.company_address;
		updated.pickup = draft.pickup;
		updated.delivery = draft.delivery;
		updated.vehicles = draft.vehicles;
		updated.status = OrderStatus::Submitted;
		self.persist(updated, order.version).await
	}

	/// Marks an order paid after the payment collaborator's success
	/// callback. Treated as an ordinary actor-initiated action: ownership
	/// is re-validated and the transition table applies.
	pub async fn payment_success(&self, actor: &Actor, order_id: &str) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		authorize(actor, Action::PaymentSuccess, Some(&order))?;
		require_status(&order, Action::PaymentSuccess)?;

		let mut updated = order.clone();
		updated.status = OrderStatus::Paid;
		updated.is_paid = true;
		let updated = self.persist(updated, order.version).await?;
		tracing::info!(request_number = %updated.request_number, "Order paid");
		Ok(updated)
	}

	/// Reads one order for its requester.
	pub async fn order_for_requester(
		&self,
		actor: &Actor,
		order_id: &str,
	) -> Result<Order, CoreError> {
		let order = self.fetch(order_id).await?;
		if order.requester != actor.id {
			return Err(CoreError::Unauthorized);
		}
		Ok(order)
	}

	/// Reads one order by request number for the admin detail view.
	pub async fn order_by_number(&self, actor: &Actor, number: &str) -> Result<Order, CoreError> {
		authorize(actor, Action::AdminOrderRead, None)?;
		self.orders
			.find_by_number(number)
			.await?
			.ok_or(CoreError::NotFound)
	}

	async fn fetch(&self, order_id: &str) -> Result<Order, CoreError> {
		self.orders
			.find_by_id(order_id)
			.await?
			.ok_or(CoreError::NotFound)
	}

	async fn persist(&self, order: Order, expected_version: u64) -> Result<Order, CoreError> {
		Ok(self.orders.update(order, expected_version).await?)
	}

	fn spawn_notification(&self, order: Order) {
		let notifier = Arc::clone(&self.notifier);
		tokio::spawn(async move {
			if let Err(e) = notifier.order_created(&order).await {
				tracing::warn!(
					request_number = %order.request_number,
					error = %e,
					"Order notification failed"
				);
			}
		});
	}
}

fn require_status(order: &Order, action: Action) -> Result<(), CoreError> {
	let allowed = ALLOWED_FROM
		.get(&action)
		.unwrap_or_else(|| panic!("no transition entry for {action}"));
	if allowed.contains(&order.status) {
		Ok(())
	} else {
		Err(CoreError::InvalidTransition {
			from: order.status,
			action,
		})
	}
}
