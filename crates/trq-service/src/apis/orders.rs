//! Customer order API.
//!
//! Creation, the customer dashboard, quote responses, edits, and the
//! checkout hand-off. Every route resolves the actor first and goes through
//! the transition engine; handlers never touch order fields themselves.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use trq_core::{Action, CoreError, DeclineDecision};
use trq_types::{Contact, Order, OrderDraft, OrderStatus, Stop, Vehicle};

use crate::apis::PageBody;
use crate::error::ApiError;
use crate::server::{resolve_actor, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopBody {
	pub location: String,
	pub contact: ContactBody,
}

#[derive(Debug, Deserialize)]
pub struct ContactBody {
	pub name: String,
	pub phone: String,
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleBody {
	pub vin: String,
	#[serde(default)]
	pub make: String,
	#[serde(default)]
	pub model: String,
}

/// Order fields a customer submits. Company fields are optional; absent
/// ones are filled from the requester's profile.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
	#[serde(default)]
	pub company_name: Option<String>,
	#[serde(default)]
	pub company_address: Option<String>,
	pub pickup: StopBody,
	pub delivery: StopBody,
	pub vehicles: Vec<VehicleBody>,
}

impl From<StopBody> for Stop {
	fn from(body: StopBody) -> Self {
		Stop {
			location: body.location,
			contact: Contact {
				name: body.contact.name,
				phone: body.contact.phone,
				email: body.contact.email,
			},
		}
	}
}

/// Builds the domain draft, decoding VINs for vehicles the customer left
/// without make/model hints.
async fn build_draft(
	state: &AppState,
	request: DraftRequest,
	default_company: (&str, &str),
) -> OrderDraft {
	let mut vehicles = Vec::with_capacity(request.vehicles.len());
	for v in request.vehicles {
		let (make, model) = if v.make.is_empty() && v.model.is_empty() {
			let info = state.vin.lookup(&v.vin).await;
			(info.make, info.model)
		} else {
			(v.make, v.model)
		};
		vehicles.push(Vehicle {
			vin: v.vin,
			make,
			model,
		});
	}
	OrderDraft {
		company_name: request
			.company_name
			.unwrap_or_else(|| default_company.0.to_string()),
		company_address: request
			.company_address
			.unwrap_or_else(|| default_company.1.to_string()),
		pickup: request.pickup.into(),
		delivery: request.delivery.into(),
		vehicles,
	}
}

/// Handles POST /orders.
pub async fn create(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(request): Json<DraftRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let profile = state
		.users
		.find_by_id(&actor.id)
		.await
		.map_err(|e| ApiError::Core(e.into()))?
		.ok_or(ApiError::Unauthenticated)?;
	let draft = build_draft(
		&state,
		request,
		(&profile.company_name, &profile.company_address),
	)
	.await;
	let order = state.engine.create(&actor, draft).await?;
	Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
	#[serde(default = "default_page")]
	pub page: usize,
}

fn default_page() -> usize {
	1
}

#[derive(Debug, Serialize)]
pub struct CustomerDashboardBody {
	pub active: PageBody<Order>,
	pub archived: PageBody<Order>,
}

/// Handles GET /orders/dashboard.
pub async fn dashboard(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(query): Query<PageQuery>,
) -> Result<Json<CustomerDashboardBody>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let dash = state
		.dashboards
		.customer_dashboard(&actor, query.page)
		.await?;
	Ok(Json(CustomerDashboardBody {
		active: dash.active.into(),
		archived: dash.archived.into(),
	}))
}

/// Handles GET /orders/{id}.
pub async fn get_order(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.order_for_requester(&actor, &id).await?;
	Ok(Json(order))
}

/// Handles POST /orders/{id}/accept.
pub async fn accept(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.accept_quote(&actor, &id).await?;
	Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct DeclineRequest {
	/// Either `cancel` or `requote`.
	pub action: String,
}

#[derive(Debug, Serialize)]
pub struct DeclineBody {
	pub order: Order,
	/// Where to revise the order, present when it went back for re-quoting.
	pub edit_url: Option<String>,
}

/// Handles POST /orders/{id}/decline.
pub async fn decline(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(request): Json<DeclineRequest>,
) -> Result<Json<DeclineBody>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let decision = match request.action.as_str() {
		"cancel" => DeclineDecision::Cancel,
		"requote" => DeclineDecision::Requote,
		other => {
			return Err(
				CoreError::InvalidInput(format!("unknown decline action: {other:?}")).into(),
			)
		}
	};
	let order = state.engine.decline_quote(&actor, &id, decision).await?;
	let edit_url = (decision == DeclineDecision::Requote).then(|| {
		format!(
			"{}/orders/{}/edit",
			state.config.service.public_url, order.id
		)
	});
	Ok(Json(DeclineBody { order, edit_url }))
}

/// Handles POST /orders/{id}/edit.
///
/// Absent company fields keep the order's current values rather than
/// falling back to the profile; an edit is a revision, not a resubmission
/// from scratch.
pub async fn edit(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(request): Json<DraftRequest>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let current = state.engine.order_for_requester(&actor, &id).await?;
	let draft = build_draft(
		&state,
		request,
		(&current.company_name, &current.company_address),
	)
	.await;
	let order = state.engine.edit_and_resubmit(&actor, &id, draft).await?;
	Ok(Json(order))
}

#[derive(Debug, Serialize)]
pub struct CheckoutBody {
	/// Redirect target for completing payment.
	pub url: String,
}

/// Handles POST /orders/{id}/checkout.
///
/// Only an accepted, priced order can reach the payment provider. The
/// wrong-status case reports the same transition violation the eventual
/// payment-success would.
pub async fn checkout(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<CheckoutBody>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.order_for_requester(&actor, &id).await?;
	if order.status != OrderStatus::Accepted {
		return Err(CoreError::InvalidTransition {
			from: order.status,
			action: Action::PaymentSuccess,
		}
		.into());
	}
	let price = order.price.ok_or_else(|| {
		CoreError::Internal(format!("accepted order {} has no price", order.request_number))
	})?;

	let base = &state.config.service.public_url;
	let success_url = format!("{base}/orders/{}/payment-success", order.id);
	let cancel_url = format!("{base}/orders/dashboard");
	let session = state
		.payment
		.create_checkout(price, &order.request_number, &success_url, &cancel_url)
		.await?;
	Ok(Json(CheckoutBody { url: session.url }))
}

/// Handles GET /orders/{id}/payment-success.
///
/// The provider's success-return path. Ownership and the transition table
/// are re-validated in full; a forged return URL buys nothing.
pub async fn payment_success(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.payment_success(&actor, &id).await?;
	Ok(Json(order))
}
