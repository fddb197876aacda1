//! HTTP server for the TRQ API.
//!
//! Builds the router, owns the shared application state, and resolves the
//! acting identity for each request. Handlers live under [`crate::apis`];
//! this module only wires them together.

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use trq_account::AccountService;
use trq_config::Config;
use trq_core::{DashboardRouter, TransitionEngine};
use trq_payment::PaymentGateway;
use trq_storage::UserStore;
use trq_types::Actor;
use trq_vin::VinLookup;

use crate::apis;
use crate::error::ApiError;

/// Header carrying the authenticated user id.
///
/// Session handling sits in front of this service; whatever terminates the
/// session is expected to translate it into this header.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// The single gateway to order mutation.
	pub engine: Arc<TransitionEngine>,
	/// Dashboard bucket queries.
	pub dashboards: Arc<DashboardRouter>,
	/// Registration and password flows.
	pub accounts: Arc<AccountService>,
	/// User lookups for actor resolution.
	pub users: Arc<dyn UserStore>,
	/// Checkout-session collaborator.
	pub payment: Arc<dyn PaymentGateway>,
	/// VIN decode collaborator.
	pub vin: Arc<dyn VinLookup>,
	/// Complete configuration.
	pub config: Config,
}

/// Resolves the acting identity from the request headers.
///
/// A missing header or an unknown id both fail as unauthenticated; the
/// distinction is deliberately not leaked to the caller.
pub async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
	let id = headers
		.get(ACTOR_HEADER)
		.and_then(|v| v.to_str().ok())
		.ok_or(ApiError::Unauthenticated)?;
	let user = state
		.users
		.find_by_id(id)
		.await
		.map_err(|e| ApiError::Core(e.into()))?
		.ok_or(ApiError::Unauthenticated)?;
	Ok(Actor::new(user.id, user.role))
}

/// Builds the router with all API routes.
pub fn build_router(state: AppState) -> Router {
	Router::new()
		.route("/auth/register", post(apis::auth::register))
		.route("/auth/login", post(apis::auth::login))
		.route("/auth/forgot-password", post(apis::auth::forgot_password))
		.route(
			"/auth/reset-password/{token}",
			post(apis::auth::reset_password),
		)
		.route("/orders", post(apis::orders::create))
		.route("/orders/dashboard", get(apis::orders::dashboard))
		.route("/orders/{id}", get(apis::orders::get_order))
		.route("/orders/{id}/accept", post(apis::orders::accept))
		.route("/orders/{id}/decline", post(apis::orders::decline))
		.route("/orders/{id}/edit", post(apis::orders::edit))
		.route("/orders/{id}/checkout", post(apis::orders::checkout))
		.route(
			"/orders/{id}/payment-success",
			get(apis::orders::payment_success),
		)
		.route("/admin/dashboard", get(apis::admin::dashboard))
		.route("/admin/orders/{number}", get(apis::admin::get_order))
		.route("/admin/orders/{id}/price", post(apis::admin::set_price))
		.route("/admin/orders/{id}/claim", post(apis::admin::claim))
		.route("/admin/orders/{id}/reassign", post(apis::admin::reassign))
		.route("/admin/orders/{id}/requote", post(apis::admin::requote))
		.route("/vin/{vin}", get(apis::vin::decode))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
	let bind = state.config.service.bind.clone();
	let app = build_router(state);
	let listener = TcpListener::bind(&bind).await?;
	tracing::info!("TRQ API server starting on {}", bind);
	axum::serve(listener, app).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::http::{Request, StatusCode};
	use http_body_util::BodyExt;
	use serde_json::{json, Value};
	use tower::ServiceExt;
	use trq_notify::implementations::log::LogNotifier;
	use trq_payment::MockPaymentGateway;
	use trq_storage::implementations::memory::{MemoryOrderStore, MemoryUserStore};
	use trq_vin::NullVinLookup;

	fn test_config() -> Config {
		Config::from_toml_str(
			r#"
[service]
bind = "127.0.0.1:0"
public_url = "http://localhost:3000"
"#,
		)
		.unwrap()
	}

	fn test_state() -> AppState {
		let orders = Arc::new(MemoryOrderStore::new());
		let users = Arc::new(MemoryUserStore::new());
		let engine = Arc::new(TransitionEngine::new(
			Arc::clone(&orders) as Arc<dyn trq_storage::OrderStore>,
			Arc::clone(&users) as Arc<dyn UserStore>,
			Arc::new(LogNotifier::new()),
		));
		let dashboards = Arc::new(DashboardRouter::new(
			Arc::clone(&orders) as Arc<dyn trq_storage::OrderStore>,
			10,
		));
		let accounts = Arc::new(AccountService::new(
			Arc::clone(&users) as Arc<dyn UserStore>
		));
		AppState {
			engine,
			dashboards,
			accounts,
			users,
			payment: Arc::new(MockPaymentGateway),
			vin: Arc::new(NullVinLookup),
			config: test_config(),
		}
	}

	async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
		let response = router.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = response.into_body().collect().await.unwrap().to_bytes();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, body)
	}

	fn post_json(uri: &str, actor: Option<&str>, body: Value) -> Request<Body> {
		let mut builder = Request::post(uri).header("content-type", "application/json");
		if let Some(id) = actor {
			builder = builder.header(ACTOR_HEADER, id);
		}
		builder.body(Body::from(body.to_string())).unwrap()
	}

	fn get_req(uri: &str, actor: Option<&str>) -> Request<Body> {
		let mut builder = Request::get(uri);
		if let Some(id) = actor {
			builder = builder.header(ACTOR_HEADER, id);
		}
		builder.body(Body::empty()).unwrap()
	}

	async fn register(router: &Router, email: &str) -> String {
		let (status, body) = send(
			router,
			post_json(
				"/auth/register",
				None,
				json!({
					"email": email,
					"password": "hunter22",
					"password2": "hunter22",
					"companyName": "Acme Freight",
					"companyAddress": "1 Dock Rd",
				}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED, "{body}");
		body["userId"].as_str().unwrap().to_string()
	}

	/// Registers an account, then promotes it in the store directly; the
	/// public API deliberately has no promotion endpoint.
	async fn seed_admin(state: &AppState, router: &Router, email: &str) -> String {
		let id = register(router, email).await;
		let mut user = state.users.find_by_id(&id).await.unwrap().unwrap();
		user.role = trq_types::Role::Admin;
		state.users.update(user).await.unwrap();
		id
	}

	fn draft_body() -> Value {
		json!({
			"pickup": {
				"location": "Newark, NJ",
				"contact": {"name": "Pat", "phone": "555-0100"}
			},
			"delivery": {
				"location": "Tampa, FL",
				"contact": {"name": "Sam", "phone": "555-0200"}
			},
			"vehicles": [{"vin": "1HGCM82633A004352"}]
		})
	}

	#[tokio::test]
	async fn lifecycle_over_http() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;
		let admin = seed_admin(&state, &router, "admin@trq.test").await;

		// Create: company fields come from the requester's profile
		let (status, order) =
			send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		assert_eq!(status, StatusCode::CREATED, "{order}");
		assert_eq!(order["request_number"], "TRQ_1");
		assert_eq!(order["status"], "Submitted");
		assert_eq!(order["company_name"], "Acme Freight");
		let id = order["id"].as_str().unwrap().to_string();

		// Admin claims and prices
		let (status, _) = send(
			&router,
			post_json(&format!("/admin/orders/{id}/claim"), Some(&admin), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let (status, order) = send(
			&router,
			post_json(
				&format!("/admin/orders/{id}/price"),
				Some(&admin),
				json!({"price": "250.00"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{order}");
		assert_eq!(order["status"], "Quoted");

		// Customer accepts and checks out
		let (status, order) = send(
			&router,
			post_json(&format!("/orders/{id}/accept"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{order}");
		assert_eq!(order["status"], "Accepted");

		let (status, session) = send(
			&router,
			post_json(&format!("/orders/{id}/checkout"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{session}");
		assert_eq!(session["url"], "mock://checkout/TRQ_1/25000");

		let (status, order) = send(
			&router,
			get_req(&format!("/orders/{id}/payment-success"), Some(&customer)),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{order}");
		assert_eq!(order["status"], "Paid");
		assert_eq!(order["is_paid"], true);
	}

	#[tokio::test]
	async fn missing_actor_is_unauthenticated() {
		let router = build_router(test_state());
		let (status, body) = send(&router, post_json("/orders", None, draft_body())).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "UNAUTHENTICATED");

		let (status, _) = send(&router, post_json("/orders", Some("ghost"), draft_body())).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn customer_cannot_use_admin_routes() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;

		let (status, order) =
			send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		assert_eq!(status, StatusCode::CREATED);
		let id = order["id"].as_str().unwrap();

		let (status, body) = send(
			&router,
			post_json(
				&format!("/admin/orders/{id}/price"),
				Some(&customer),
				json!({"price": "100"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "UNAUTHORIZED");

		let (status, _) = send(&router, get_req("/admin/dashboard", Some(&customer))).await;
		assert_eq!(status, StatusCode::FORBIDDEN);
	}

	#[tokio::test]
	async fn decline_requote_points_at_edit() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;
		let admin = seed_admin(&state, &router, "admin@trq.test").await;

		let (_, order) = send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		let id = order["id"].as_str().unwrap().to_string();
		send(
			&router,
			post_json(
				&format!("/admin/orders/{id}/price"),
				Some(&admin),
				json!({"price": "99.50"}),
			),
		)
		.await;

		let (status, body) = send(
			&router,
			post_json(
				&format!("/orders/{id}/decline"),
				Some(&customer),
				json!({"action": "requote"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{body}");
		assert_eq!(body["order"]["status"], "Re-quote");
		assert_eq!(
			body["edit_url"],
			format!("http://localhost:3000/orders/{id}/edit")
		);

		// Cancel path is terminal
		let (_, order) = send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		let id2 = order["id"].as_str().unwrap().to_string();
		send(
			&router,
			post_json(
				&format!("/admin/orders/{id2}/price"),
				Some(&admin),
				json!({"price": "99.50"}),
			),
		)
		.await;
		let (status, body) = send(
			&router,
			post_json(
				&format!("/orders/{id2}/decline"),
				Some(&customer),
				json!({"action": "cancel"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["order"]["status"], "Cancelled");
		assert!(body["edit_url"].is_null());
	}

	#[tokio::test]
	async fn invalid_transition_maps_to_conflict() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;

		let (_, order) = send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		let id = order["id"].as_str().unwrap();

		// Accept straight out of Submitted is not legal
		let (status, body) = send(
			&router,
			post_json(&format!("/orders/{id}/accept"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_TRANSITION");
	}

	#[tokio::test]
	async fn dashboards_split_by_role() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;
		let admin = seed_admin(&state, &router, "admin@trq.test").await;

		for _ in 0..3 {
			let (status, _) =
				send(&router, post_json("/orders", Some(&customer), draft_body())).await;
			assert_eq!(status, StatusCode::CREATED);
		}

		let (status, body) = send(&router, get_req("/orders/dashboard", Some(&customer))).await;
		assert_eq!(status, StatusCode::OK, "{body}");
		assert_eq!(body["active"]["items"].as_array().unwrap().len(), 3);
		assert_eq!(body["archived"]["items"].as_array().unwrap().len(), 0);

		let (status, body) = send(&router, get_req("/admin/dashboard?page=1", Some(&admin))).await;
		assert_eq!(status, StatusCode::OK, "{body}");
		assert_eq!(body["unclaimed"]["items"].as_array().unwrap().len(), 3);
		assert_eq!(body["mine"]["items"].as_array().unwrap().len(), 0);
		assert_eq!(body["unclaimed"]["total_pages"], 1);
	}

	#[tokio::test]
	async fn admin_order_detail_by_number() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;
		let admin = seed_admin(&state, &router, "admin@trq.test").await;

		send(&router, post_json("/orders", Some(&customer), draft_body())).await;

		let (status, body) = send(&router, get_req("/admin/orders/TRQ_1", Some(&admin))).await;
		assert_eq!(status, StatusCode::OK, "{body}");
		assert_eq!(body["request_number"], "TRQ_1");

		let (status, _) = send(&router, get_req("/admin/orders/TRQ_99", Some(&admin))).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn register_rejects_password_mismatch() {
		let router = build_router(test_state());
		let (status, body) = send(
			&router,
			post_json(
				"/auth/register",
				None,
				json!({
					"email": "ops@acme.test",
					"password": "hunter22",
					"password2": "different",
					"companyName": "Acme Freight",
					"companyAddress": "1 Dock Rd",
				}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(body["error"], "INVALID_INPUT");
	}

	#[tokio::test]
	async fn login_round_trip() {
		let router = build_router(test_state());
		let id = register(&router, "ops@acme.test").await;

		let (status, body) = send(
			&router,
			post_json(
				"/auth/login",
				None,
				json!({"email": "ops@acme.test", "password": "hunter22"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["userId"], id.as_str());
		assert_eq!(body["role"], "user");

		let (status, _) = send(
			&router,
			post_json(
				"/auth/login",
				None,
				json!({"email": "ops@acme.test", "password": "wrong"}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn unpriced_order_cannot_be_accepted() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;
		let admin = seed_admin(&state, &router, "admin@trq.test").await;

		// Admin requote from Submitted: acceptable status, but no quote issued
		let (_, order) = send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		let id = order["id"].as_str().unwrap().to_string();
		let (status, order) = send(
			&router,
			post_json(&format!("/admin/orders/{id}/requote"), Some(&admin), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::OK, "{order}");
		assert_eq!(order["status"], "Re-quote");

		let (status, body) = send(
			&router,
			post_json(&format!("/orders/{id}/accept"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT, "{body}");
		assert_eq!(body["error"], "INVALID_TRANSITION");

		let (status, _) = send(
			&router,
			post_json(&format!("/orders/{id}/checkout"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
	}

	#[tokio::test]
	async fn checkout_requires_acceptance_and_price() {
		let state = test_state();
		let router = build_router(state.clone());
		let customer = register(&router, "ops@acme.test").await;

		let (_, order) = send(&router, post_json("/orders", Some(&customer), draft_body())).await;
		let id = order["id"].as_str().unwrap();

		let (status, body) = send(
			&router,
			post_json(&format!("/orders/{id}/checkout"), Some(&customer), json!({})),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT, "{body}");
	}

	#[tokio::test]
	async fn vin_route_answers_unknown_without_decoder() {
		let router = build_router(test_state());
		let (status, body) = send(&router, get_req("/vin/1HGCM82633A004352", None)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["make"], "");
		assert_eq!(body["model"], "");
	}
}
