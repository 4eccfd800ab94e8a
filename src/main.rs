//! Marketplace gate server: loads configuration, wires the shared token manager and limiter,
//! and serves the gate router until interrupted.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use marketplace_gate::{
	config::GateConfig,
	flows::TokenManager,
	gate::{self, GateState},
	obs,
	rate_limit::RateLimiter,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	obs::init_subscriber();

	let config = GateConfig::from_env()?;
	let tokens = Arc::new(TokenManager::new(config.descriptor()?, config.credentials.clone()));
	let limiter = Arc::new(RateLimiter::new(config.policy));
	let sweeper = gate::spawn_sweeper(limiter.clone(), config.sweep_interval);
	let listener = TcpListener::bind(config.bind).await?;

	tracing::info!(
		bind = %config.bind,
		environment = ?config.environment,
		max_requests = config.policy.max_requests,
		"Marketplace gate listening."
	);

	axum::serve(listener, gate::router(GateState::new(tokens, limiter)))
		.with_graceful_shutdown(shutdown_signal())
		.await?;
	sweeper.abort();

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;

	tracing::info!("Shutting down.");
}
