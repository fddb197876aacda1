//! API error mapping.
//!
//! One place turning core/account/payment failures into HTTP responses
//! with a stable error code and a human-readable message. Handlers never
//! build status codes by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use trq_account::AccountError;
use trq_core::CoreError;
use trq_payment::PaymentError;

/// JSON body attached to every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	/// Stable machine-readable code.
	pub error: String,
	/// Human-readable description, safe to show the user.
	pub message: String,
}

/// The service-level error all handlers return.
#[derive(Debug)]
pub enum ApiError {
	/// No actor could be resolved for the request.
	Unauthenticated,
	Core(CoreError),
	Account(AccountError),
	Payment(PaymentError),
}

impl From<CoreError> for ApiError {
	fn from(err: CoreError) -> Self {
		ApiError::Core(err)
	}
}

impl From<AccountError> for ApiError {
	fn from(err: AccountError) -> Self {
		ApiError::Account(err)
	}
}

impl From<PaymentError> for ApiError {
	fn from(err: PaymentError) -> Self {
		ApiError::Payment(err)
	}
}

impl ApiError {
	fn status_and_code(&self) -> (StatusCode, &'static str) {
		match self {
			ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
			ApiError::Core(err) => match err {
				CoreError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
				CoreError::Unauthorized => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
				CoreError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
				CoreError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
				CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
				CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
			},
			ApiError::Account(err) => match err {
				AccountError::InvalidInput(_) => {
					(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT")
				}
				AccountError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
				AccountError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
				AccountError::TokenInvalid => (StatusCode::UNPROCESSABLE_ENTITY, "TOKEN_INVALID"),
				AccountError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
			},
			ApiError::Payment(err) => match err {
				PaymentError::InvalidAmount(_) => {
					(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_AMOUNT")
				}
				PaymentError::Provider(_) => (StatusCode::BAD_GATEWAY, "PAYMENT_PROVIDER"),
			},
		}
	}

	fn message(&self) -> String {
		match self {
			ApiError::Unauthenticated => "authentication required".to_string(),
			ApiError::Core(err) => err.to_string(),
			ApiError::Account(err) => err.to_string(),
			ApiError::Payment(err) => err.to_string(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, code) = self.status_and_code();
		if status.is_server_error() {
			tracing::error!(code, message = %self.message(), "Request failed");
		}
		let body = ErrorResponse {
			error: code.to_string(),
			message: self.message(),
		};
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use trq_core::Action;
	use trq_types::OrderStatus;

	#[test]
	fn core_errors_map_to_expected_statuses() {
		let cases = [
			(CoreError::NotFound, StatusCode::NOT_FOUND),
			(CoreError::Unauthorized, StatusCode::FORBIDDEN),
			(
				CoreError::InvalidInput("bad".into()),
				StatusCode::UNPROCESSABLE_ENTITY,
			),
			(
				CoreError::InvalidTransition {
					from: OrderStatus::Paid,
					action: Action::Requote,
				},
				StatusCode::CONFLICT,
			),
			(CoreError::Conflict("raced".into()), StatusCode::CONFLICT),
		];
		for (err, expected) in cases {
			let (status, _) = ApiError::Core(err).status_and_code();
			assert_eq!(status, expected);
		}
	}
}
