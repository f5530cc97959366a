//! Client side of the authority protocol used by the session gateway.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::{RequestBuilder, StatusCode, redirect::Policy};
#[cfg(feature = "reqwest")] use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, authority::Validation};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	protocol::{
		Envelope, HEARTBEAT_PATH, ISSUE_PATH, IssueRequest, IssuedTokenData, REVOKE_PATH,
		RevokeRequest, VALIDATE_PATH, ValidateRequest,
	},
};

/// Boxed future returned by every [`AuthorityClient`] call.
pub type AuthorityFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + 'a + Send>>;

/// What the gateway needs from a token authority.
///
/// The gateway only ever talks to the authority through this trait, so tests and embedded
/// deployments can swap the HTTP client for an in-process double.
pub trait AuthorityClient
where
	Self: Send + Sync,
{
	/// Returns the owner's live secret, creating one when none exists.
	fn issue<'a>(&'a self, owner: &'a Owner) -> AuthorityFuture<'a, TokenSecret>;

	/// Checks `token` against the owner's live secret.
	fn validate<'a>(&'a self, owner: &'a Owner, token: &'a str) -> AuthorityFuture<'a, Validation>;

	/// Removes the owner's secret.
	fn revoke<'a>(&'a self, owner: &'a Owner) -> AuthorityFuture<'a, ()>;

	/// Liveness probe used at startup.
	fn ping(&self) -> AuthorityFuture<'_, ()>;
}

/// Failures talking to the token authority.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Connection, TLS, or protocol failure below HTTP.
	#[error("Network error occurred while calling the token authority.")]
	Transport {
		/// Transport-specific network error.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
	/// The authority did not answer within the configured bound.
	#[error("Token authority did not answer within {after:?}.")]
	Timeout {
		/// Bound that elapsed.
		after: StdDuration,
	},
	/// The authority answered with a status the operation does not accept.
	#[error("Token authority answered {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Envelope message or a body excerpt.
		message: String,
	},
	/// The authority answered with a body that could not be decoded.
	#[error("Token authority returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The issue response decoded but carried no token.
	#[error("Token authority returned an issue response without a token.")]
	MissingToken,
}
impl UpstreamError {
	/// Wraps a transport-specific network error.
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}

#[cfg(feature = "reqwest")]
/// Longest body excerpt carried in [`UpstreamError::Status`] when the body is not an envelope.
const BODY_EXCERPT_CHARS: usize = 200;

#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
struct Endpoints {
	issue: Url,
	validate: Url,
	revoke: Url,
	heartbeat: Url,
}
#[cfg(feature = "reqwest")]
impl Endpoints {
	/// Resolves every operation path beneath `base`, keeping any path prefix it carries.
	fn resolve(base: &Url) -> Result<Self, ConfigError> {
		let mut root = base.clone();

		if !root.path().ends_with('/') {
			let prefix = format!("{}/", root.path());

			root.set_path(&prefix);
		}

		let join = |path: &str| {
			root.join(path.trim_start_matches('/')).map_err(|e| ConfigError::Invalid {
				key: "AUTHORITY_URL",
				message: e.to_string(),
			})
		};

		Ok(Self {
			issue: join(ISSUE_PATH)?,
			validate: join(VALIDATE_PATH)?,
			revoke: join(REVOKE_PATH)?,
			heartbeat: join(HEARTBEAT_PATH)?,
		})
	}
}

/// reqwest-backed [`AuthorityClient`].
///
/// Redirects are never followed; the authority answers directly. Every request is bounded by
/// the timeout given at construction.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct HttpAuthorityClient {
	client: ReqwestClient,
	endpoints: Endpoints,
	timeout: StdDuration,
}
#[cfg(feature = "reqwest")]
impl HttpAuthorityClient {
	/// Builds a client for the authority rooted at `base`.
	pub fn new(base: Url, timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).timeout(timeout).build()?;

		Self::with_client(client, base, timeout)
	}

	/// Reuses a caller-provided reqwest client.
	///
	/// `timeout` is only used to label [`UpstreamError::Timeout`]; the bound itself must be
	/// configured on `client`.
	pub fn with_client(
		client: ReqwestClient,
		base: Url,
		timeout: StdDuration,
	) -> Result<Self, ConfigError> {
		Ok(Self { client, endpoints: Endpoints::resolve(&base)?, timeout })
	}

	async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, Vec<u8>), UpstreamError> {
		let response = request.send().await.map_err(|e| self.map_reqwest_error(e))?;
		let status = response.status();
		let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?.to_vec();

		Ok((status, body))
	}

	fn map_reqwest_error(&self, e: ReqwestError) -> UpstreamError {
		if e.is_timeout() {
			UpstreamError::Timeout { after: self.timeout }
		} else {
			UpstreamError::transport(e)
		}
	}
}
#[cfg(feature = "reqwest")]
impl AuthorityClient for HttpAuthorityClient {
	fn issue<'a>(&'a self, owner: &'a Owner) -> AuthorityFuture<'a, TokenSecret> {
		Box::pin(async move {
			let request = self
				.client
				.get(self.endpoints.issue.clone())
				.json(&IssueRequest { email: owner.clone() });
			let (status, body) = self.send(request).await?;

			if status != StatusCode::ACCEPTED {
				return Err(unexpected_status(status, &body));
			}

			let envelope: Envelope<IssuedTokenData> = decode(&body)?;

			envelope.data.map(|data| data.token).ok_or(UpstreamError::MissingToken)
		})
	}

	fn validate<'a>(&'a self, owner: &'a Owner, token: &'a str) -> AuthorityFuture<'a, Validation> {
		Box::pin(async move {
			let request = self
				.client
				.post(self.endpoints.validate.clone())
				.json(&ValidateRequest { user: owner.clone(), token: token.to_owned() });
			let (status, body) = self.send(request).await?;

			// The wire protocol folds "absent" into the same 401 as a mismatch.
			match status {
				StatusCode::ACCEPTED => Ok(Validation::Valid),
				StatusCode::UNAUTHORIZED => Ok(Validation::Mismatch),
				status => Err(unexpected_status(status, &body)),
			}
		})
	}

	fn revoke<'a>(&'a self, owner: &'a Owner) -> AuthorityFuture<'a, ()> {
		Box::pin(async move {
			let request = self
				.client
				.delete(self.endpoints.revoke.clone())
				.json(&RevokeRequest { email: owner.clone() });
			let (status, body) = self.send(request).await?;

			if status != StatusCode::ACCEPTED {
				return Err(unexpected_status(status, &body));
			}

			Ok(())
		})
	}

	fn ping(&self) -> AuthorityFuture<'_, ()> {
		Box::pin(async move {
			let (status, body) =
				self.send(self.client.get(self.endpoints.heartbeat.clone())).await?;

			if !status.is_success() {
				return Err(unexpected_status(status, &body));
			}

			Ok(())
		})
	}
}

#[cfg(feature = "reqwest")]
fn decode<T>(body: &[u8]) -> Result<T, UpstreamError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| UpstreamError::Decode { source })
}

#[cfg(feature = "reqwest")]
fn unexpected_status(status: StatusCode, body: &[u8]) -> UpstreamError {
	let message = match serde_json::from_slice::<Envelope>(body) {
		Ok(envelope) if !envelope.message.is_empty() => envelope.message,
		_ => String::from_utf8_lossy(body).chars().take(BODY_EXCERPT_CHARS).collect(),
	};

	UpstreamError::Status { status: status.as_u16(), message }
}
