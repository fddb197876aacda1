//! Payment collaborator for the TRQ service.
//!
//! Builds provider checkout sessions for accepted orders. The collaborator
//! receives the quoted price and the request number, and produces a redirect
//! target where the customer completes payment. The provider's
//! success-return path re-enters the core as an ordinary payment-success
//! action with full ownership re-validation; nothing here mutates orders.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while creating a checkout session.
#[derive(Debug, Error)]
pub enum PaymentError {
	/// Error that occurs when the amount is zero, negative, or not
	/// representable in cents.
	#[error("Invalid payment amount: {0}")]
	InvalidAmount(String),
	/// Error from the payment provider.
	#[error("Provider error: {0}")]
	Provider(String),
}

/// A created checkout session: where to send the customer.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
	/// Redirect target for completing payment.
	pub url: String,
}

/// Trait defining the payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
	/// Creates a checkout session for an accepted order.
	async fn create_checkout(
		&self,
		price: Decimal,
		request_number: &str,
		success_url: &str,
		cancel_url: &str,
	) -> Result<CheckoutSession, PaymentError>;
}

/// Converts a quoted price to integer cents, refusing non-positive amounts.
///
/// This runs before any provider call so a zero-priced session can never be
/// created.
pub fn amount_in_cents(price: Decimal) -> Result<i64, PaymentError> {
	let cents = price
		.checked_mul(Decimal::from(100))
		.ok_or_else(|| PaymentError::InvalidAmount(format!("{price} out of range")))?
		.round();
	let cents = cents
		.to_i64()
		.ok_or_else(|| PaymentError::InvalidAmount(format!("{price} out of range")))?;
	if cents <= 0 {
		return Err(PaymentError::InvalidAmount(format!(
			"{price} is not positive"
		)));
	}
	Ok(cents)
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
	url: String,
}

/// Gateway backed by an HTTP checkout-session endpoint.
pub struct HttpPaymentGateway {
	client: reqwest::Client,
	endpoint: String,
	secret_key: String,
	currency: String,
}

impl HttpPaymentGateway {
	pub fn new(endpoint: String, secret_key: String, currency: String) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
			secret_key,
			currency,
		}
	}
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
	async fn create_checkout(
		&self,
		price: Decimal,
		request_number: &str,
		success_url: &str,
		cancel_url: &str,
	) -> Result<CheckoutSession, PaymentError> {
		let cents = amount_in_cents(price)?;
		let product_name = format!("Transport Request #{request_number}");

		let params = [
			("mode", "payment"),
			("currency", self.currency.as_str()),
			("product_name", product_name.as_str()),
			("unit_amount", &cents.to_string()),
			("success_url", success_url),
			("cancel_url", cancel_url),
		];
		let response = self
			.client
			.post(&self.endpoint)
			.bearer_auth(&self.secret_key)
			.form(&params)
			.send()
			.await
			.map_err(|e| PaymentError::Provider(e.to_string()))?;

		if !response.status().is_success() {
			return Err(PaymentError::Provider(format!(
				"checkout endpoint returned {}",
				response.status()
			)));
		}
		let session: SessionResponse = response
			.json()
			.await
			.map_err(|e| PaymentError::Provider(e.to_string()))?;
		tracing::info!(request_number, cents, "Created checkout session");
		Ok(CheckoutSession { url: session.url })
	}
}

/// Gateway for tests and development: deterministic URLs, no network.
#[derive(Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
	async fn create_checkout(
		&self,
		price: Decimal,
		request_number: &str,
		_success_url: &str,
		_cancel_url: &str,
	) -> Result<CheckoutSession, PaymentError> {
		let cents = amount_in_cents(price)?;
		Ok(CheckoutSession {
			url: format!("mock://checkout/{request_number}/{cents}"),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use std::str::FromStr;

	#[test]
	fn cents_conversion_rounds() {
		assert_eq!(amount_in_cents(Decimal::from_str("250.00").unwrap()).unwrap(), 25000);
		assert_eq!(amount_in_cents(Decimal::from_str("99.995").unwrap()).unwrap(), 10000);
	}

	#[test]
	fn extreme_amounts_refused_not_panicked() {
		assert!(matches!(
			amount_in_cents(Decimal::MAX),
			Err(PaymentError::InvalidAmount(_))
		));
	}

	#[test]
	fn zero_and_negative_amounts_refused() {
		assert!(matches!(
			amount_in_cents(Decimal::ZERO),
			Err(PaymentError::InvalidAmount(_))
		));
		assert!(matches!(
			amount_in_cents(Decimal::from_str("-5").unwrap()),
			Err(PaymentError::InvalidAmount(_))
		));
	}

	#[tokio::test]
	async fn mock_gateway_embeds_amount() {
		let session = MockPaymentGateway
			.create_checkout(
				Decimal::from_str("250.00").unwrap(),
				"TRQ_1",
				"http://x/success",
				"http://x/cancel",
			)
			.await
			.unwrap();
		assert_eq!(session.url, "mock://checkout/TRQ_1/25000");
	}
}
