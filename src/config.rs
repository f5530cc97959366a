//! Environment-driven settings for both binaries.
//!
//! Each loader reads through a lookup closure so tests can supply values without touching the
//! process environment; `from_env` wires that closure to [`std::env::var`].

// std
use std::{env, net::SocketAddr};
// self
use crate::{
	_prelude::*, auth::SESSION_TTL, error::ConfigError, store::timeout::DEFAULT_STORE_TIMEOUT,
};

const DEFAULT_BIND: &str = "0.0.0.0:80";
const DEFAULT_AUTHORITY_URL: &str = "http://authentication-service";
const DEFAULT_NAMESPACE: &str = "userTokens";

/// Backend selected by `AUTHORITY_STORE_URL`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
	/// Process-local [`MemoryStore`](crate::store::MemoryStore).
	Memory,
	/// Redis at the given URL.
	Redis(String),
}
impl FromStr for StoreBackend {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let scheme = s.split_once("://").map(|(scheme, _)| scheme).unwrap_or(s);

		match scheme {
			"memory" => Ok(Self::Memory),
			"redis" | "rediss" => Ok(Self::Redis(s.to_owned())),
			other => Err(ConfigError::UnsupportedStore { scheme: other.to_owned() }),
		}
	}
}

/// Token authority settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityConfig {
	/// Listen address (`AUTHORITY_BIND`).
	pub bind: SocketAddr,
	/// Store backend (`AUTHORITY_STORE_URL`).
	pub store: StoreBackend,
	/// Key namespace inside a shared store (`AUTHORITY_STORE_NAMESPACE`).
	pub namespace: String,
	/// Lifetime of issued secrets (`SESSION_TTL_SECS`).
	pub session_ttl: Duration,
	/// Bound on every store call (`STORE_TIMEOUT_MS`).
	pub store_timeout: StdDuration,
}
impl AuthorityConfig {
	/// Loads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Loads settings through `lookup`, applying defaults for absent keys.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let bind = parse_or(&lookup, "AUTHORITY_BIND", DEFAULT_BIND)?;
		let store = lookup("AUTHORITY_STORE_URL")
			.map(|value| value.parse())
			.transpose()?
			.unwrap_or(StoreBackend::Memory);
		let namespace = lookup("AUTHORITY_STORE_NAMESPACE")
			.filter(|value| !value.trim().is_empty())
			.unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
		let ttl_secs = positive(
			"SESSION_TTL_SECS",
			parse_or(&lookup, "SESSION_TTL_SECS", &SESSION_TTL.whole_seconds().to_string())?,
		)?;
		let timeout_ms = positive(
			"STORE_TIMEOUT_MS",
			parse_or(&lookup, "STORE_TIMEOUT_MS", &DEFAULT_STORE_TIMEOUT.as_millis().to_string())?,
		)?;

		Ok(Self {
			bind,
			store,
			namespace,
			session_ttl: Duration::seconds(ttl_secs),
			store_timeout: StdDuration::from_millis(timeout_ms),
		})
	}
}

/// User service settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserServiceConfig {
	/// Listen address (`USER_SERVICE_BIND`).
	pub bind: SocketAddr,
	/// Base URL of the token authority (`AUTHORITY_URL`).
	pub authority_url: Url,
	/// Bound on every authority call (`AUTHORITY_TIMEOUT_MS`).
	pub authority_timeout: StdDuration,
}
impl UserServiceConfig {
	/// Loads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Loads settings through `lookup`, applying defaults for absent keys.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let timeout_ms =
			positive("AUTHORITY_TIMEOUT_MS", parse_or(&lookup, "AUTHORITY_TIMEOUT_MS", "3000")?)?;

		Ok(Self {
			bind: parse_or(&lookup, "USER_SERVICE_BIND", DEFAULT_BIND)?,
			authority_url: parse_or(&lookup, "AUTHORITY_URL", DEFAULT_AUTHORITY_URL)?,
			authority_timeout: StdDuration::from_millis(timeout_ms),
		})
	}
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
	T::Err: Display,
{
	let raw = lookup(key).unwrap_or_else(|| default.to_owned());

	raw.trim()
		.parse()
		.map_err(|e: T::Err| ConfigError::Invalid { key, message: format!("`{raw}`: {e}") })
}

fn positive<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
	T: Default + PartialOrd + Display,
{
	if value > T::default() {
		Ok(value)
	} else {
		Err(ConfigError::Invalid { key, message: format!("`{value}`: must be positive") })
	}
}
