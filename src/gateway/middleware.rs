//! axum middleware guarding routes that require a live session.

// crates.io
use axum::{
	extract::{Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	gateway::{SessionCookies, SessionGateway},
};

/// Owner admitted by [`require_session`], available to downstream handlers as an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub Owner);

/// Rejects the request with `401` unless its session cookies are confirmed by the authority.
///
/// Mount with [`axum::middleware::from_fn_with_state`] and an `Arc<SessionGateway>`.
pub async fn require_session(
	State(gateway): State<Arc<SessionGateway>>,
	mut request: Request,
	next: Next,
) -> Response {
	let cookies = SessionCookies::from_headers(request.headers());

	match gateway.authenticate(cookies).await {
		Ok(owner) => {
			request.extensions_mut().insert(AuthenticatedOwner(owner));

			next.run(request).await
		},
		Err(e) => e.into_response(),
	}
}
