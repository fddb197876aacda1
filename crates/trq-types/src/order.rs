//! Order types for the transport-request system.
//!
//! This module defines the order record and its component types, used
//! throughout the order lifecycle: creation, quoting, claiming, acceptance
//! and payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::UserId;

/// Opaque order identifier (UUID v4 rendered as a string).
pub type OrderId = String;

/// A transport-quote request record with its full lifecycle state.
///
/// An order is created by a customer (the requester), priced and claimed by
/// administrators, and moves through the status lifecycle until it is paid
/// or cancelled. All mutation goes through the transition engine; nothing
/// writes these fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: OrderId,
	/// Human-readable request number (`TRQ_<n>`), unique and never reused.
	pub request_number: String,
	/// The user who created this order. Immutable.
	pub requester: UserId,
	/// The admin who has claimed this order; `None` means unclaimed.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner: Option<UserId>,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Whether payment has completed. Set once, never reverts.
	pub is_paid: bool,
	/// Quoted price. Set only by the pricing action, always positive.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub price: Option<Decimal>,
	/// Company name copied from the requester's profile at creation.
	pub company_name: String,
	/// Company address copied from the requester's profile at creation.
	pub company_address: String,
	/// Pickup location and contact.
	pub pickup: Stop,
	/// Delivery location and contact.
	pub delivery: Stop,
	/// Vehicles to transport, in submission order. Never empty.
	pub vehicles: Vec<Vehicle>,
	/// Timestamp when this order was created. Immutable.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
	/// Optimistic-concurrency counter, bumped by every successful update.
	#[serde(default)]
	pub version: u64,
}

/// One end of the transport: a location plus its on-site contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
	/// Free-form location (address, terminal, yard).
	pub location: String,
	/// Contact person at this location.
	pub contact: Contact,
}

/// Contact details for a pickup or delivery location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
	/// Contact name. Required.
	pub name: String,
	/// Contact phone number. Required.
	pub phone: String,
	/// Contact email. Optional.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

/// A vehicle to be transported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
	/// Vehicle identification number.
	pub vin: String,
	/// Manufacturer, possibly filled in by the VIN decode collaborator.
	#[serde(default)]
	pub make: String,
	/// Model, possibly filled in by the VIN decode collaborator.
	#[serde(default)]
	pub model: String,
}

/// Status of an order in the transport-request lifecycle.
///
/// `Paid` and `Cancelled` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
	/// Submitted by the customer, awaiting a quote.
	Submitted,
	/// Priced by an admin, awaiting customer acceptance.
	Quoted,
	/// Sent back for a new quote, by either side.
	#[serde(rename = "Re-quote")]
	Requote,
	/// Quote accepted by the customer, awaiting payment.
	Accepted,
	/// Declined and closed by the customer.
	Cancelled,
	/// Payment completed.
	Paid,
}

impl OrderStatus {
	/// Whether this status has no outgoing transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Submitted => write!(f, "Submitted"),
			OrderStatus::Quoted => write!(f, "Quoted"),
			OrderStatus::Requote => write!(f, "Re-quote"),
			OrderStatus::Accepted => write!(f, "Accepted"),
			OrderStatus::Cancelled => write!(f, "Cancelled"),
			OrderStatus::Paid => write!(f, "Paid"),
		}
	}
}

/// Mutable order fields a requester may overwrite when resubmitting.
///
/// Everything else on [`Order`] (identity, ownership, status, payment state)
/// is off limits to edits and owned by the transition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
	pub company_name: String,
	pub company_address: String,
	pub pickup: Stop,
	pub delivery: Stop,
	pub vehicles: Vec<Vehicle>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn requote_serializes_with_hyphen() {
		let json = serde_json::to_string(&OrderStatus::Requote).unwrap();
		assert_eq!(json, "\"Re-quote\"");
		let back: OrderStatus = serde_json::from_str(&json).unwrap();
		assert_eq!(back, OrderStatus::Requote);
	}

	#[test]
	fn terminal_statuses() {
		assert!(OrderStatus::Paid.is_terminal());
		assert!(OrderStatus::Cancelled.is_terminal());
		assert!(!OrderStatus::Submitted.is_terminal());
		assert!(!OrderStatus::Requote.is_terminal());
	}
}
