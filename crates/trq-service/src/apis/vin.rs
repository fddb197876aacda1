//! VIN decode API.
//!
//! Form pre-fill helper for the submission page. Open to unauthenticated
//! callers; a VIN by itself identifies no customer, and the decode
//! collaborator degrades to empty hints on any failure.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct VinBody {
	pub make: String,
	pub model: String,
}

/// Handles GET /vin/{vin}.
pub async fn decode(State(state): State<AppState>, Path(vin): Path<String>) -> Json<VinBody> {
	let info = state.vin.lookup(&vin).await;
	Json(VinBody {
		make: info.make,
		model: info.model,
	})
}
