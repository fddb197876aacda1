//! User and actor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identifier (UUID v4 rendered as a string).
pub type UserId = String;

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Regular customer account.
	User,
	/// Administrator account.
	Admin,
}

/// A registered account.
///
/// Orders reference users by id only; a user record is never embedded in an
/// order and its lifetime is independent of any order's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	/// Unique identifier for this user.
	pub id: UserId,
	/// Login email, unique across all users.
	pub email: String,
	/// Salted password hash (`<salt>$<digest>`, hex encoded). Never the
	/// plaintext.
	pub password_hash: String,
	pub company_name: String,
	pub company_address: String,
	pub role: Role,
	pub created_at: DateTime<Utc>,
	/// Outstanding password-reset token. Set and cleared together with
	/// `reset_expires`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reset_token: Option<String>,
	/// Expiry of the outstanding reset token.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reset_expires: Option<DateTime<Utc>>,
}

/// The authenticated identity behind an inbound action.
///
/// Supplied by the identity/session layer, which has already authenticated
/// the caller; the core trusts this pair as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
	pub id: UserId,
	pub role: Role,
}

impl Actor {
	pub fn new(id: impl Into<UserId>, role: Role) -> Self {
		Self {
			id: id.into(),
			role,
		}
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}
