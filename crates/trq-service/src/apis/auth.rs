//! Account API: registration, login, and the password-reset flow.
//!
//! These routes are the only ones that run without a resolved actor. Login
//! verifies credentials and returns the identity for the session layer to
//! remember; it does not mint tokens itself.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use trq_account::{AccountError, Registration};
use trq_types::Role;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	pub email: String,
	pub password: String,
	/// Confirmation copy of the password; must match exactly.
	pub password2: String,
	pub company_name: String,
	pub company_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
	pub user_id: String,
	pub email: String,
}

/// Handles POST /auth/register.
pub async fn register(
	State(state): State<AppState>,
	Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
	if request.password != request.password2 {
		return Err(AccountError::InvalidInput("passwords do not match".into()).into());
	}
	let user = state
		.accounts
		.register(Registration {
			email: request.email,
			password: request.password,
			company_name: request.company_name,
			company_address: request.company_address,
		})
		.await?;
	Ok((
		StatusCode::CREATED,
		Json(RegisterResponse {
			user_id: user.id,
			email: user.email,
		}),
	))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	pub user_id: String,
	pub email: String,
	pub role: Role,
	pub company_name: String,
}

/// Handles POST /auth/login.
///
/// Wrong email and wrong password produce the same response.
pub async fn login(
	State(state): State<AppState>,
	Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
	let user = state
		.accounts
		.verify(&request.email, &request.password)
		.await?
		.ok_or(ApiError::Unauthenticated)?;
	Ok(Json(LoginResponse {
		user_id: user.id,
		email: user.email,
		role: user.role,
		company_name: user.company_name,
	}))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
	pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
	pub message: String,
}

/// Handles POST /auth/forgot-password.
///
/// Issues a reset token and logs the reset link. Delivery by mail is the
/// deployment's concern; the token never appears in the response.
pub async fn forgot_password(
	State(state): State<AppState>,
	Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
	let token = state.accounts.start_reset(&request.email).await?;
	let link = format!(
		"{}/auth/reset-password/{}",
		state.config.service.public_url, token
	);
	tracing::info!(email = %request.email, %link, "Issued password reset");
	Ok(Json(MessageResponse {
		message: "password reset issued".into(),
	}))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
	pub password: String,
	pub password2: String,
}

/// Handles POST /auth/reset-password/{token}.
pub async fn reset_password(
	State(state): State<AppState>,
	Path(token): Path<String>,
	Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
	if request.password != request.password2 {
		return Err(AccountError::InvalidInput("passwords do not match".into()).into());
	}
	state
		.accounts
		.complete_reset(&token, &request.password)
		.await?;
	Ok(Json(MessageResponse {
		message: "password updated".into(),
	}))
}
