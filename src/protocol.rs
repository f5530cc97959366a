//! Wire shapes shared by the token authority server and the gateway's authority client.
//!
//! | Operation | Method + path | Request | Success |
//! |---|---|---|---|
//! | issue | `GET /token` | [`IssueRequest`] | `202` + [`IssuedTokenData`] |
//! | validate | `POST /authenticate` | [`ValidateRequest`] | `202`, `401` on mismatch |
//! | revoke | `DELETE /revoke` | [`RevokeRequest`] | `202` |

// self
use crate::_prelude::*;

/// Path serving token issuance.
pub const ISSUE_PATH: &str = "/token";
/// Path serving token validation.
pub const VALIDATE_PATH: &str = "/authenticate";
/// Path serving token revocation.
pub const REVOKE_PATH: &str = "/revoke";
/// Liveness probe path exposed by both services.
pub const HEARTBEAT_PATH: &str = "/plug";

/// JSON envelope wrapping every response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T = serde_json::Value> {
	/// `true` when the response reports a failure.
	pub error: bool,
	/// Human-readable summary.
	#[serde(default)]
	pub message: String,
	/// Optional payload.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
}
impl<T> Envelope<T> {
	/// Successful envelope carrying `data`.
	pub fn success(message: impl Into<String>, data: T) -> Self {
		Self { error: false, message: message.into(), data: Some(data) }
	}

	/// Successful envelope without a payload.
	pub fn ack(message: impl Into<String>) -> Self {
		Self { error: false, message: message.into(), data: None }
	}

	/// Failure envelope without a payload.
	pub fn failure(message: impl Into<String>) -> Self {
		Self { error: true, message: message.into(), data: None }
	}
}

/// Body of `GET /token`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
	/// Owner to issue a session for.
	pub email: Owner,
}

/// Payload returned inside the issue envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokenData {
	/// Owner the token belongs to.
	pub email: Owner,
	/// The live secret for that owner.
	pub token: TokenSecret,
}

/// Body of `POST /authenticate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
	/// Owner whose session is being checked.
	pub user: Owner,
	/// Secret presented by the client.
	pub token: String,
}

/// Body of `DELETE /revoke`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRequest {
	/// Owner whose session is revoked.
	pub email: Owner,
}
