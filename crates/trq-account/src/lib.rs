//! Account management for the TRQ service.
//!
//! Registration, credential verification, and the password-reset token
//! flow. Delivery of the reset link is the notification layer's problem;
//! this module only issues and redeems tokens.

use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use trq_storage::{StorageError, UserStore};
use trq_types::{Role, User};

pub mod password;

use password::{hash_password, verify_password};

/// Lifetime of a password-reset token.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when a field fails validation.
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	/// Error that occurs when the email is already registered.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// Error that occurs when no matching user exists.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a reset token is unknown or expired.
	#[error("Reset token invalid or expired")]
	TokenInvalid,
	/// Error from the backing store.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for AccountError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound => AccountError::NotFound,
			StorageError::Conflict(msg) => AccountError::Conflict(msg),
			other => AccountError::Storage(other.to_string()),
		}
	}
}

/// Fields required to register a new account.
#[derive(Debug, Clone)]
pub struct Registration {
	pub email: String,
	pub password: String,
	pub company_name: String,
	pub company_address: String,
}

/// Service handling registration, login verification and password resets.
pub struct AccountService {
	users: Arc<dyn UserStore>,
}

impl AccountService {
	pub fn new(users: Arc<dyn UserStore>) -> Self {
		Self { users }
	}

	/// Registers a new customer account.
	///
	/// Duplicate emails fail with [`AccountError::Conflict`]; the
	/// uniqueness check is the store's, so concurrent registrations cannot
	/// both win.
	pub async fn register(&self, reg: Registration) -> Result<User, AccountError> {
		if reg.email.trim().is_empty()
			|| reg.company_name.trim().is_empty()
			|| reg.company_address.trim().is_empty()
		{
			return Err(AccountError::InvalidInput(
				"all fields are required".into(),
			));
		}
		if reg.password.len() < MIN_PASSWORD_LEN {
			return Err(AccountError::InvalidInput(format!(
				"password must be at least {MIN_PASSWORD_LEN} characters"
			)));
		}

		let user = User {
			id: uuid::Uuid::new_v4().to_string(),
			email: reg.email.trim().to_string(),
			password_hash: hash_password(&reg.password),
			company_name: reg.company_name,
			company_address: reg.company_address,
			role: Role::User,
			created_at: Utc::now(),
			reset_token: None,
			reset_expires: None,
		};
		self.users.insert(user.clone()).await?;
		tracing::info!(user_id = %user.id, "Registered user");
		Ok(user)
	}

	/// Verifies login credentials, returning the user on success.
	pub async fn verify(&self, email: &str, password: &str) -> Result<Option<User>, AccountError> {
		let Some(user) = self.users.find_by_email(email).await? else {
			return Ok(None);
		};
		if verify_password(password, &user.password_hash) {
			Ok(Some(user))
		} else {
			Ok(None)
		}
	}

	/// Starts a password reset for the given email.
	///
	/// Returns the issued token; the caller hands it to the notification
	/// layer. Unknown emails fail with [`AccountError::NotFound`].
	pub async fn start_reset(&self, email: &str) -> Result<String, AccountError> {
		let mut user = self
			.users
			.find_by_email(email)
			.await?
			.ok_or(AccountError::NotFound)?;

		let mut raw = [0u8; 20];
		rand::thread_rng().fill_bytes(&mut raw);
		let token = hex::encode(raw);

		user.reset_token = Some(token.clone());
		user.reset_expires = Some(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS));
		self.users.update(user).await?;
		Ok(token)
	}

	/// Completes a password reset.
	///
	/// The token must match an outstanding, unexpired reset. On success the
	/// password is replaced and the token pair cleared together.
	pub async fn complete_reset(
		&self,
		token: &str,
		new_password: &str,
	) -> Result<(), AccountError> {
		if new_password.len() < MIN_PASSWORD_LEN {
			return Err(AccountError::InvalidInput(format!(
				"password must be at least {MIN_PASSWORD_LEN} characters"
			)));
		}
		let mut user = self
			.users
			.find_by_reset_token(token)
			.await?
			.ok_or(AccountError::TokenInvalid)?;
		match user.reset_expires {
			Some(expires) if expires > Utc::now() => {}
			_ => return Err(AccountError::TokenInvalid),
		}

		user.password_hash = hash_password(new_password);
		user.reset_token = None;
		user.reset_expires = None;
		self.users.update(user).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use trq_storage::implementations::memory::MemoryUserStore;

	fn service() -> AccountService {
		AccountService::new(Arc::new(MemoryUserStore::new()))
	}

	fn registration(email: &str) -> Registration {
		Registration {
			email: email.into(),
			password: "hunter22".into(),
			company_name: "Acme Freight".into(),
			company_address: "1 Dock Rd".into(),
		}
	}

	#[tokio::test]
	async fn register_and_verify() {
		let service = service();
		let user = service.register(registration("ops@acme.test")).await.unwrap();
		assert_eq!(user.role, Role::User);

		let verified = service.verify("ops@acme.test", "hunter22").await.unwrap();
		assert!(verified.is_some());
		let wrong = service.verify("ops@acme.test", "wrong").await.unwrap();
		assert!(wrong.is_none());
	}

	#[tokio::test]
	async fn duplicate_email_conflicts() {
		let service = service();
		service.register(registration("ops@acme.test")).await.unwrap();
		let err = service
			.register(registration("ops@acme.test"))
			.await
			.unwrap_err();
		assert!(matches!(err, AccountError::Conflict(_)));
	}

	#[tokio::test]
	async fn short_password_rejected() {
		let service = service();
		let mut reg = registration("ops@acme.test");
		reg.password = "short".into();
		assert!(matches!(
			service.register(reg).await,
			Err(AccountError::InvalidInput(_))
		));
	}

	#[tokio::test]
	async fn reset_flow_round_trip() {
		let service = service();
		service.register(registration("ops@acme.test")).await.unwrap();

		let token = service.start_reset("ops@acme.test").await.unwrap();
		service.complete_reset(&token, "newpassword").await.unwrap();

		assert!(service
			.verify("ops@acme.test", "newpassword")
			.await
			.unwrap()
			.is_some());
		// Token is single-use
		assert!(matches!(
			service.complete_reset(&token, "another1").await,
			Err(AccountError::TokenInvalid)
		));
	}

	#[tokio::test]
	async fn expired_token_is_rejected() {
		let users = Arc::new(MemoryUserStore::new());
		let service = AccountService::new(Arc::clone(&users) as Arc<dyn UserStore>);
		service.register(registration("ops@acme.test")).await.unwrap();
		let token = service.start_reset("ops@acme.test").await.unwrap();

		// Age the token past its window
		let mut user = users
			.find_by_email("ops@acme.test")
			.await
			.unwrap()
			.unwrap();
		user.reset_expires = Some(Utc::now() - Duration::minutes(1));
		users.update(user).await.unwrap();

		assert!(matches!(
			service.complete_reset(&token, "newpassword").await,
			Err(AccountError::TokenInvalid)
		));
	}

	#[tokio::test]
	async fn unknown_email_reset_fails() {
		let service = service();
		assert!(matches!(
			service.start_reset("nobody@acme.test").await,
			Err(AccountError::NotFound)
		));
	}
}
