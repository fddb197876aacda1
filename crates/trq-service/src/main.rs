//! Main entry point for the TRQ service.
//!
//! This binary serves the transport-quote-request API: customers submit
//! orders and respond to quotes, administrators price and claim them, and
//! payment closes the loop. Collaborators (notification, VIN decode,
//! payment) are selected from configuration at startup.

use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use trq_account::password::hash_password;
use trq_account::AccountService;
use trq_config::Config;
use trq_core::{DashboardRouter, TransitionEngine};
use trq_notify::implementations::log::LogNotifier;
use trq_notify::implementations::webhook::WebhookNotifier;
use trq_notify::OrderNotifier;
use trq_payment::{HttpPaymentGateway, MockPaymentGateway, PaymentGateway};
use trq_storage::implementations::memory::{MemoryOrderStore, MemoryUserStore};
use trq_storage::{OrderStore, UserStore};
use trq_types::{Role, User};
use trq_vin::{HttpVinLookup, NullVinLookup, VinLookup};

mod apis;
mod error;
mod server;

use server::AppState;

/// Command-line arguments for the TRQ service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.to_string()));
	fmt().with_env_filter(env_filter).with_target(true).init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(bind = %config.service.bind, "Loaded configuration");

	let state = build_state(config).await?;
	server::start_server(state).await
}

/// Wires the application state from configuration.
async fn build_state(config: Config) -> Result<AppState, Box<dyn std::error::Error>> {
	// `memory` is the only backend shipped here; config validation already
	// rejected anything else.
	let orders: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
	let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());

	let notifier: Arc<dyn OrderNotifier> = match (config.notify.enabled, &config.notify.recipient_endpoint) {
		(true, Some(endpoint)) => {
			tracing::info!(%endpoint, "Order notifications via webhook");
			Arc::new(WebhookNotifier::new(endpoint.clone()))
		}
		_ => {
			tracing::info!("Order notifications via log only");
			Arc::new(LogNotifier::new())
		}
	};

	let vin: Arc<dyn VinLookup> = match &config.vin.endpoint {
		Some(endpoint) => Arc::new(HttpVinLookup::new(
			endpoint.clone(),
			config.vin.api_key.clone(),
		)),
		None => {
			tracing::info!("No VIN decode endpoint configured, lookups answer unknown");
			Arc::new(NullVinLookup)
		}
	};

	let payment: Arc<dyn PaymentGateway> = match &config.payment {
		Some(pay) => Arc::new(HttpPaymentGateway::new(
			pay.endpoint.clone(),
			pay.secret_key.clone(),
			pay.currency.clone(),
		)),
		None => {
			tracing::warn!("No payment provider configured, using mock checkout sessions");
			Arc::new(MockPaymentGateway)
		}
	};

	if let Some(bootstrap) = &config.bootstrap {
		seed_admin(users.as_ref(), &bootstrap.admin_email, &bootstrap.admin_password).await?;
	}

	let engine = Arc::new(TransitionEngine::new(
		Arc::clone(&orders),
		Arc::clone(&users),
		notifier,
	));
	let dashboards = Arc::new(DashboardRouter::new(
		Arc::clone(&orders),
		config.pagination.page_size,
	));
	let accounts = Arc::new(AccountService::new(Arc::clone(&users)));

	Ok(AppState {
		engine,
		dashboards,
		accounts,
		users,
		payment,
		vin,
		config,
	})
}

/// Seeds the bootstrap administrator account if it does not exist yet.
async fn seed_admin(
	users: &dyn UserStore,
	email: &str,
	password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
	if users.find_by_email(email).await?.is_some() {
		return Ok(());
	}
	let user = User {
		id: uuid::Uuid::new_v4().to_string(),
		email: email.to_string(),
		password_hash: hash_password(password),
		company_name: "TRQ Operations".to_string(),
		company_address: String::new(),
		role: Role::Admin,
		created_at: Utc::now(),
		reset_token: None,
		reset_expires: None,
	};
	tracing::info!(%email, "Seeded bootstrap administrator");
	users.insert(user).await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(extra: &str) -> Config {
		Config::from_toml_str(&format!(
			r#"
[service]
bind = "127.0.0.1:0"
public_url = "http://localhost:3000"
{extra}
"#
		))
		.unwrap()
	}

	#[tokio::test]
	async fn build_state_with_minimal_config() {
		let state = build_state(config("")).await.unwrap();
		assert_eq!(state.config.pagination.page_size, 10);
	}

	#[tokio::test]
	async fn bootstrap_admin_is_seeded_once() {
		let state = build_state(config(
			"[bootstrap]\nadmin_email = \"root@trq.test\"\nadmin_password = \"changeme1\"",
		))
		.await
		.unwrap();
		let admin = state
			.users
			.find_by_email("root@trq.test")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(admin.role, Role::Admin);

		// Re-seeding the same store is a no-op, not a conflict
		seed_admin(state.users.as_ref(), "root@trq.test", "changeme1")
			.await
			.unwrap();
	}
}
