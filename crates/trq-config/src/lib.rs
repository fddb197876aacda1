//! Configuration module for the TRQ service.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required configuration values are
//! properly set.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the TRQ service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// HTTP service settings.
	pub service: ServiceConfig,
	/// Storage backend selection.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Order-created notification settings.
	#[serde(default)]
	pub notify: NotifyConfig,
	/// VIN decode collaborator settings.
	#[serde(default)]
	pub vin: VinConfig,
	/// Payment collaborator settings.
	pub payment: Option<PaymentConfig>,
	/// Dashboard pagination settings.
	#[serde(default)]
	pub pagination: PaginationConfig,
	/// Optional administrator account seeded at startup.
	pub bootstrap: Option<BootstrapConfig>,
}

/// Administrator account seeded at startup.
///
/// Registration only ever creates customer accounts, so a fresh deployment
/// needs at least one admin from somewhere.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
	pub admin_email: String,
	pub admin_password: String,
}

/// HTTP service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Address the HTTP server binds to, e.g. `127.0.0.1:3000`.
	pub bind: String,
	/// Public base URL used to build payment return links,
	/// e.g. `https://transport.example.com`.
	pub public_url: String,
}

/// Storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which backend to use. Only `memory` ships with the service.
	pub backend: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: "memory".to_string(),
		}
	}
}

/// Order-created notification settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifyConfig {
	/// Whether to deliver notifications at all. When false the log-only
	/// sink is used.
	#[serde(default)]
	pub enabled: bool,
	/// Endpoint that receives the exported order, e.g. an inbound-mail
	/// webhook.
	pub recipient_endpoint: Option<String>,
}

/// VIN decode collaborator settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VinConfig {
	/// Decode API base URL. Absent means lookups resolve to empty hints.
	pub endpoint: Option<String>,
	/// Optional bearer token for the decode API.
	pub api_key: Option<String>,
}

/// Payment collaborator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	/// Checkout-session endpoint of the payment provider.
	pub endpoint: String,
	/// Provider secret key.
	pub secret_key: String,
	/// ISO currency code for checkout sessions.
	#[serde(default = "default_currency")]
	pub currency: String,
}

fn default_currency() -> String {
	"usd".to_string()
}

/// Dashboard pagination settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
	/// Orders per dashboard page.
	#[serde(default = "default_page_size")]
	pub page_size: usize,
}

fn default_page_size() -> usize {
	10
}

impl Default for PaginationConfig {
	fn default() -> Self {
		Self {
			page_size: default_page_size(),
		}
	}
}

impl Config {
	/// Parses configuration from a TOML string and validates it.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads configuration from a TOML file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		Self::from_toml_str(&raw)
	}

	/// Checks cross-field consistency that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.bind.is_empty() {
			return Err(ConfigError::Validation("service.bind is empty".into()));
		}
		if self.service.public_url.is_empty() {
			return Err(ConfigError::Validation(
				"service.public_url is empty".into(),
			));
		}
		if self.pagination.page_size == 0 {
			return Err(ConfigError::Validation(
				"pagination.page_size must be at least 1".into(),
			));
		}
		if self.notify.enabled && self.notify.recipient_endpoint.is_none() {
			return Err(ConfigError::Validation(
				"notify.enabled requires notify.recipient_endpoint".into(),
			));
		}
		if self.storage.backend != "memory" {
			return Err(ConfigError::Validation(format!(
				"unknown storage backend: {}",
				self.storage.backend
			)));
		}
		if let Some(bootstrap) = &self.bootstrap {
			if bootstrap.admin_email.is_empty() || bootstrap.admin_password.is_empty() {
				return Err(ConfigError::Validation(
					"bootstrap admin email and password must both be set".into(),
				));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const MINIMAL: &str = r#"
[service]
bind = "127.0.0.1:3000"
public_url = "http://localhost:3000"
"#;

	#[test]
	fn minimal_config_defaults() {
		let config = Config::from_toml_str(MINIMAL).unwrap();
		assert_eq!(config.pagination.page_size, 10);
		assert_eq!(config.storage.backend, "memory");
		assert!(!config.notify.enabled);
		assert!(config.payment.is_none());
		assert!(config.bootstrap.is_none());
	}

	#[test]
	fn bootstrap_fields_must_be_set() {
		let raw = format!("{MINIMAL}\n[bootstrap]\nadmin_email = \"\"\nadmin_password = \"pw\"\n");
		let err = Config::from_toml_str(&raw).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn notify_enabled_requires_endpoint() {
		let raw = format!("{MINIMAL}\n[notify]\nenabled = true\n");
		let err = Config::from_toml_str(&raw).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn zero_page_size_rejected() {
		let raw = format!("{MINIMAL}\n[pagination]\npage_size = 0\n");
		let err = Config::from_toml_str(&raw).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[tokio::test]
	async fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(MINIMAL.as_bytes()).unwrap();
		let config = Config::from_file(file.path()).await.unwrap();
		assert_eq!(config.service.bind, "127.0.0.1:3000");
	}
}
