//! Admin order API: the work queue and every admin-only order action.
//!
//! Role checks live in the authorization guard, not here; these handlers
//! pass the resolved actor straight through and let the core refuse.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use trq_core::parse_price;
use trq_types::Order;

use crate::apis::orders::PageQuery;
use crate::apis::PageBody;
use crate::error::ApiError;
use crate::server::{resolve_actor, AppState};

#[derive(Debug, Serialize)]
pub struct AdminDashboardBody {
	pub mine: PageBody<Order>,
	pub unclaimed: PageBody<Order>,
	pub claimed: PageBody<Order>,
}

/// Handles GET /admin/dashboard.
pub async fn dashboard(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(query): Query<PageQuery>,
) -> Result<Json<AdminDashboardBody>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let dash = state.dashboards.admin_dashboard(&actor, query.page).await?;
	Ok(Json(AdminDashboardBody {
		mine: dash.mine.into(),
		unclaimed: dash.unclaimed.into(),
		claimed: dash.claimed.into(),
	}))
}

/// Handles GET /admin/orders/{number}.
pub async fn get_order(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(number): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.order_by_number(&actor, &number).await?;
	Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct SetPriceRequest {
	/// Decimal amount as a string, e.g. `"250.00"`.
	pub price: String,
}

/// Handles POST /admin/orders/{id}/price.
pub async fn set_price(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(request): Json<SetPriceRequest>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let price = parse_price(&request.price)?;
	let order = state.engine.set_price(&actor, &id, price).await?;
	Ok(Json(order))
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimRequest {
	/// Take the order even if another admin already holds it.
	#[serde(default, rename = "override")]
	pub override_existing: bool,
}

/// Handles POST /admin/orders/{id}/claim.
pub async fn claim(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(request): Json<ClaimRequest>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state
		.engine
		.claim(&actor, &id, request.override_existing)
		.await?;
	Ok(Json(order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
	pub new_owner_id: String,
}

/// Handles POST /admin/orders/{id}/reassign.
pub async fn reassign(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
	Json(request): Json<ReassignRequest>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state
		.engine
		.reassign(&actor, &id, &request.new_owner_id)
		.await?;
	Ok(Json(order))
}

/// Handles POST /admin/orders/{id}/requote.
pub async fn requote(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
	let actor = resolve_actor(&state, &headers).await?;
	let order = state.engine.requote(&actor, &id).await?;
	Ok(Json(order))
}
