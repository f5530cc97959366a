//! Session token records and their lifecycle state.

// self
use crate::_prelude::*;

/// Lifetime of every issued session, and of the cookies that carry it.
pub const SESSION_TTL: Duration = Duration::hours(24);

/// Lifecycle state of a session token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
	/// The token is live.
	Active,
	/// The token outlived its TTL.
	Expired,
}

/// Opaque bearer secret bound to a single owner for a fixed lifetime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionToken {
	/// Identity the token was issued to.
	pub owner: Owner,
	/// Bearer value; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Instant the token was written to the store.
	pub issued_at: OffsetDateTime,
	/// Instant after which the store no longer returns the token.
	pub expires_at: OffsetDateTime,
}
impl SessionToken {
	/// Creates a token issued at `issued_at` that lives for `ttl`.
	pub fn new(owner: Owner, secret: TokenSecret, issued_at: OffsetDateTime, ttl: Duration) -> Self {
		Self { owner, secret, issued_at, expires_at: issued_at + ttl }
	}

	/// Time-to-live the token was issued with.
	pub fn ttl(&self) -> Duration {
		self.expires_at - self.issued_at
	}

	/// Computes the lifecycle state at a given instant.
	pub fn state_at(&self, instant: OffsetDateTime) -> SessionState {
		if instant >= self.expires_at { SessionState::Expired } else { SessionState::Active }
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.state_at(instant), SessionState::Expired)
	}
}
