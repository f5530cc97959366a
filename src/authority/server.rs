//! HTTP surface of the token authority.

// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	authority::{TokenAuthority, Validation},
	http::{self, JsonBody},
	protocol::{
		Envelope, HEARTBEAT_PATH, ISSUE_PATH, IssueRequest, IssuedTokenData, REVOKE_PATH,
		RevokeRequest, VALIDATE_PATH, ValidateRequest,
	},
};

/// Message returned for both mismatched and absent secrets.
pub const UNAUTHORIZED_MESSAGE: &str = "Request unauthorized";

/// Builds the authority router.
pub fn router(authority: Arc<TokenAuthority>) -> Router {
	Router::new()
		.route(ISSUE_PATH, get(issue))
		.route(VALIDATE_PATH, post(authenticate))
		.route(REVOKE_PATH, delete(revoke))
		.route(HEARTBEAT_PATH, get(http::heartbeat))
		.layer(http::body_limit())
		.layer(TraceLayer::new_for_http())
		.with_state(authority)
}

async fn issue(
	State(authority): State<Arc<TokenAuthority>>,
	JsonBody(request): JsonBody<IssueRequest>,
) -> Result<Response> {
	let issued = authority.issue(&request.email).await?;

	Ok(http::accepted(Envelope::success(
		format!("Token generated for user {}", issued.owner),
		IssuedTokenData { email: issued.owner, token: issued.secret },
	)))
}

async fn authenticate(
	State(authority): State<Arc<TokenAuthority>>,
	JsonBody(request): JsonBody<ValidateRequest>,
) -> Result<Response> {
	if request.token.is_empty() {
		return Err(Error::bad_request("token: must not be empty"));
	}

	match authority.validate(&request.user, &request.token).await? {
		Validation::Valid => Ok(http::accepted(Envelope::<()>::ack(format!(
			"Valid token for user {}",
			request.user
		)))),
		Validation::Mismatch | Validation::Absent => Ok((
			StatusCode::UNAUTHORIZED,
			Json(Envelope::<()>::failure(UNAUTHORIZED_MESSAGE)),
		)
			.into_response()),
	}
}

async fn revoke(
	State(authority): State<Arc<TokenAuthority>>,
	JsonBody(request): JsonBody<RevokeRequest>,
) -> Result<Response> {
	authority.revoke(&request.email).await?;

	Ok(http::accepted(Envelope::<()>::ack(format!("Token revoked for user {}", request.email))))
}
