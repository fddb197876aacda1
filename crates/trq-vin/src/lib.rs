//! VIN decode collaborator for the TRQ service.
//!
//! Decodes a vehicle identification number into a make/model hint used to
//! pre-fill submission forms. This is enrichment only, never authoritative:
//! the contract is that lookup cannot fail into the caller. Any decode
//! problem degrades to empty strings and a warning in the log.

use async_trait::async_trait;
use serde::Deserialize;

/// Decoded vehicle hint. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleInfo {
	pub make: String,
	pub model: String,
}

/// Trait defining the VIN decode collaborator.
#[async_trait]
pub trait VinLookup: Send + Sync {
	/// Decodes a VIN. Infallible by contract; unknown fields come back
	/// empty.
	async fn lookup(&self, vin: &str) -> VehicleInfo;
}

/// Lookup that always answers "unknown". Used when no decode API is
/// configured, and in tests.
#[derive(Default)]
pub struct NullVinLookup;

#[async_trait]
impl VinLookup for NullVinLookup {
	async fn lookup(&self, _vin: &str) -> VehicleInfo {
		VehicleInfo::default()
	}
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
	#[serde(default)]
	make: String,
	#[serde(default)]
	model: String,
}

/// Lookup backed by an HTTP decode API.
///
/// Issues `GET {endpoint}/{vin}` with an optional bearer token and expects
/// a `{ "make": ..., "model": ... }` JSON body.
pub struct HttpVinLookup {
	client: reqwest::Client,
	endpoint: String,
	api_key: Option<String>,
}

impl HttpVinLookup {
	pub fn new(endpoint: String, api_key: Option<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			endpoint,
			api_key,
		}
	}

	async fn try_lookup(&self, vin: &str) -> Result<VehicleInfo, reqwest::Error> {
		let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), vin);
		let mut request = self.client.get(url);
		if let Some(key) = &self.api_key {
			request = request.bearer_auth(key);
		}
		let decoded: DecodeResponse = request.send().await?.error_for_status()?.json().await?;
		Ok(VehicleInfo {
			make: decoded.make,
			model: decoded.model,
		})
	}
}

#[async_trait]
impl VinLookup for HttpVinLookup {
	async fn lookup(&self, vin: &str) -> VehicleInfo {
		match self.try_lookup(vin).await {
			Ok(info) => info,
			Err(e) => {
				tracing::warn!(vin, error = %e, "VIN lookup failed");
				VehicleInfo::default()
			}
		}
	}
}
