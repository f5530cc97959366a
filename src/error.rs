//! Crate-level error taxonomy shared by the token authority, the session gateway, and the user
//! routes.

// crates.io
use axum::http::StatusCode;
// self
use crate::{_prelude::*, gateway::UpstreamError, store::StoreError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
///
/// Semantic token decisions (mismatch, absence) are not errors; they surface as
/// [`Validation`](crate::authority::Validation) values. Only malformed input, rejected
/// credentials, and infrastructure failures land here.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Malformed or missing input.
	#[error("{message}")]
	BadRequest {
		/// Field-level description of what was wrong.
		message: String,
	},
	/// Well-formed request whose credential or session check failed.
	#[error("Invalid session.")]
	Unauthorized,
	/// The token authority was reachable but declined to issue a session.
	#[error("Session issuance was declined: {reason}.")]
	Forbidden {
		/// Internal reason; never sent to clients.
		reason: String,
	},
	/// The token store could not be reached or timed out.
	#[error(transparent)]
	StoreUnavailable(#[from] StoreError),
	/// The token authority could not be reached, timed out, or answered unexpectedly.
	#[error(transparent)]
	UpstreamUnavailable(#[from] UpstreamError),
	/// Unexpected failure during revoke or cleanup.
	#[error("Internal failure: {reason}.")]
	Internal {
		/// Internal reason; never sent to clients.
		reason: String,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Convenience constructor for [`Error::BadRequest`].
	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::BadRequest { message: message.into() }
	}

	/// HTTP status the error maps to at a service boundary.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::Forbidden { .. } => StatusCode::FORBIDDEN,
			Self::StoreUnavailable(_)
			| Self::UpstreamUnavailable(_)
			| Self::Internal { .. }
			| Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message safe to return to clients.
	///
	/// Only input-validation messages are echoed back; everything else collapses into a
	/// generic phrase so internal detail never leaks.
	pub fn public_message(&self) -> String {
		match self {
			Self::BadRequest { message } => message.clone(),
			Self::Unauthorized => "invalid session".into(),
			Self::Forbidden { .. } => "unable to start a session".into(),
			Self::StoreUnavailable(_)
			| Self::UpstreamUnavailable(_)
			| Self::Internal { .. }
			| Self::Config(_) => "internal server error".into(),
		}
	}
}

/// Configuration failures raised while loading settings or building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An environment value could not be parsed.
	#[error("Configuration value `{key}` is invalid: {message}.")]
	Invalid {
		/// Environment variable name.
		key: &'static str,
		/// Parser message.
		message: String,
	},
	/// The store URL names a backend this build does not include.
	#[error("Store backend `{scheme}` is not available in this build.")]
	UnsupportedStore {
		/// URL scheme that was requested.
		scheme: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
