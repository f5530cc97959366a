//! HTTP plumbing shared by both services: JSON body extraction with field-level errors,
//! envelope responses, and the heartbeat probe.

// crates.io
use axum::{
	Json,
	async_trait,
	body::Bytes,
	extract::{DefaultBodyLimit, FromRequest, Request},
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, protocol::Envelope};

/// Largest request body either service accepts.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Layer capping request bodies at [`MAX_BODY_BYTES`].
pub fn body_limit() -> DefaultBodyLimit {
	DefaultBodyLimit::max(MAX_BODY_BYTES)
}

/// JSON extractor whose rejections name the offending field.
///
/// The body must hold exactly one JSON value; trailing data is rejected. `Content-Type` is not
/// inspected.
#[derive(Clone, Debug)]
pub struct JsonBody<T>(pub T);
#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
	S: Send + Sync,
	T: DeserializeOwned,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let bytes = Bytes::from_request(req, state)
			.await
			.map_err(|rejection| Error::bad_request(rejection.body_text()))?;

		decode_json(&bytes).map(Self)
	}
}

/// Decodes a single JSON value, reporting the failing path on error.
pub fn decode_json<T>(bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);
	let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
		let path = e.path().to_string();
		let inner = e.into_inner();

		if path == "." {
			Error::bad_request(inner.to_string())
		} else {
			Error::bad_request(format!("{path}: {inner}"))
		}
	})?;

	deserializer.end().map_err(|_| Error::bad_request("body must have only a single JSON value"))?;

	Ok(value)
}

/// `202 Accepted` with the provided envelope, the success status both services use.
pub fn accepted<T>(envelope: Envelope<T>) -> Response
where
	T: Serialize,
{
	(StatusCode::ACCEPTED, Json(envelope)).into_response()
}

/// Heartbeat handler mounted at [`HEARTBEAT_PATH`](crate::protocol::HEARTBEAT_PATH).
pub async fn heartbeat() -> &'static str {
	"."
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::info!(error = %self, status = status.as_u16(), "request rejected");
		}

		(status, Json(Envelope::<()>::failure(self.public_message()))).into_response()
	}
}
