//! Gate configuration loaded from the process environment (and `.env`, when present).

// std
use std::{
	env,
	net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};
// self
use crate::{
	_prelude::*,
	auth::ClientCredentials,
	error::ConfigError,
	provider::{Environment, MarketplaceDescriptor},
	rate_limit::RateLimitPolicy,
};

/// Address the gate binds when `GATE_BIND` is unset.
pub const DEFAULT_BIND: SocketAddr =
	SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3001));
/// Seconds between limiter sweeps when `RATE_LIMIT_SWEEP_SECS` is unset.
pub const DEFAULT_SWEEP_SECS: u64 = 60;

/// Everything the gate binary needs to start.
#[derive(Clone, Debug)]
pub struct GateConfig {
	/// Marketplace application credentials.
	pub credentials: ClientCredentials,
	/// Upstream environment.
	pub environment: Environment,
	/// Listen address.
	pub bind: SocketAddr,
	/// Admission policy applied per client.
	pub policy: RateLimitPolicy,
	/// Interval between limiter sweeps.
	pub sweep_interval: std::time::Duration,
}
impl GateConfig {
	/// Loads `.env` if present, then reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let _ = dotenvy::dotenv();

		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Builds a configuration from an arbitrary key lookup.
	///
	/// `EBAY_APP_ID` and `EBAY_CERT_ID` are required; every other key falls back to the
	/// server defaults.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |var: &'static str| {
			lookup(var)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::MissingEnv { var })
		};
		let credentials =
			ClientCredentials::new(required("EBAY_APP_ID")?, required("EBAY_CERT_ID")?);
		let environment = match lookup("EBAY_ENVIRONMENT") {
			None => Environment::default(),
			Some(value) => value
				.parse()
				.map_err(|value| ConfigError::InvalidEnv { var: "EBAY_ENVIRONMENT", value })?,
		};
		let bind = parse_or(&lookup, "GATE_BIND", DEFAULT_BIND)?;
		let defaults = RateLimitPolicy::server();
		let policy = RateLimitPolicy {
			max_requests: parse_or(&lookup, "RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?,
			window: Duration::milliseconds(parse_or(
				&lookup,
				"RATE_LIMIT_WINDOW_MS",
				defaults.window.whole_milliseconds() as i64,
			)?),
			min_interval: Duration::milliseconds(parse_or(
				&lookup,
				"RATE_LIMIT_MIN_INTERVAL_MS",
				defaults.min_interval.whole_milliseconds() as i64,
			)?),
		};

		policy.validate()?;

		let sweep_secs = parse_or(&lookup, "RATE_LIMIT_SWEEP_SECS", DEFAULT_SWEEP_SECS)?;

		if sweep_secs == 0 {
			return Err(ConfigError::InvalidEnv {
				var: "RATE_LIMIT_SWEEP_SECS",
				value: sweep_secs.to_string(),
			});
		}

		Ok(Self {
			credentials,
			environment,
			bind,
			policy,
			sweep_interval: std::time::Duration::from_secs(sweep_secs),
		})
	}

	/// Descriptor for the configured environment.
	pub fn descriptor(&self) -> Result<MarketplaceDescriptor, ConfigError> {
		Ok(MarketplaceDescriptor::ebay(self.environment)?)
	}
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
{
	match lookup(var) {
		Some(value) =>
			value.trim().parse().map_err(|_| ConfigError::InvalidEnv { var, value: value.clone() }),
		None => Ok(default),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map = pairs
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		move |key| map.get(key).cloned()
	}

	#[test]
	fn defaults_match_the_server_policy() {
		let config = GateConfig::from_lookup(lookup(&[
			("EBAY_APP_ID", "app"),
			("EBAY_CERT_ID", "cert"),
		]))
		.expect("Minimal configuration should load.");

		assert_eq!(config.policy, RateLimitPolicy::server());
		assert_eq!(config.environment, Environment::Production);
		assert_eq!(config.bind.port(), 3001);
		assert_eq!(config.sweep_interval, std::time::Duration::from_secs(60));
		assert_eq!(config.credentials.cert_id(), "cert");
	}

	#[test]
	fn overrides_are_parsed() {
		let config = GateConfig::from_lookup(lookup(&[
			("EBAY_APP_ID", "app"),
			("EBAY_CERT_ID", "cert"),
			("EBAY_ENVIRONMENT", "sandbox"),
			("GATE_BIND", "127.0.0.1:8080"),
			("RATE_LIMIT_MAX_REQUESTS", "10"),
			("RATE_LIMIT_WINDOW_MS", "30000"),
			("RATE_LIMIT_MIN_INTERVAL_MS", "250"),
		]))
		.expect("Overridden configuration should load.");

		assert_eq!(config.environment, Environment::Sandbox);
		assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
		assert_eq!(config.policy.max_requests, 10);
		assert_eq!(config.policy.window, Duration::seconds(30));
		assert_eq!(config.policy.min_interval, Duration::milliseconds(250));
		assert!(config.descriptor().is_ok());
	}

	#[test]
	fn missing_and_invalid_values_are_reported() {
		let missing = GateConfig::from_lookup(lookup(&[("EBAY_APP_ID", "app")]))
			.expect_err("Missing cert id should fail.");

		assert!(matches!(missing, ConfigError::MissingEnv { var: "EBAY_CERT_ID" }));

		let invalid = GateConfig::from_lookup(lookup(&[
			("EBAY_APP_ID", "app"),
			("EBAY_CERT_ID", "cert"),
			("RATE_LIMIT_MAX_REQUESTS", "lots"),
		]))
		.expect_err("Non-numeric limits should fail.");

		assert!(matches!(invalid, ConfigError::InvalidEnv { var: "RATE_LIMIT_MAX_REQUESTS", .. }));

		let zero = GateConfig::from_lookup(lookup(&[
			("EBAY_APP_ID", "app"),
			("EBAY_CERT_ID", "cert"),
			("RATE_LIMIT_MAX_REQUESTS", "0"),
		]))
		.expect_err("Zero quotas should fail.");

		assert!(matches!(zero, ConfigError::InvalidPolicy { .. }));
	}
}
