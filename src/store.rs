//! Token Store contract and built-in store implementations.
//!
//! A store keeps at most one secret per [`Owner`] under a single namespace, expires entries
//! after their TTL, and exposes an atomic set-if-absent write. That write is the only
//! coordination point between concurrent issuers, including issuers in other processes that
//! share the same backend. Stores never retry internally; the caller owns retry policy.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;
pub mod timeout;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use self::redis::RedisStore;
pub use timeout::TimeoutStore;

// self
use crate::_prelude::*;

/// Boxed future returned by every [`TokenStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by token stores.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the live secret for `owner`; expired or never-written entries are absent.
	fn get<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>>;

	/// Atomically writes `secret` only when no live entry exists for `owner`.
	///
	/// Returns `true` when this call created the entry and `false` when another entry was
	/// already live. Must be atomic with respect to every other caller of the same backend.
	fn set_if_absent<'a>(
		&'a self,
		owner: &'a Owner,
		secret: &'a TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, bool>;

	/// Removes the entry for `owner`; succeeds when nothing was stored.
	fn delete<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The backend could not be reached or rejected the command.
	#[error("Token store is unavailable: {message}.")]
	Unavailable {
		/// Human-readable error payload.
		message: String,
	},
	/// The operation did not finish within the configured bound.
	#[error("Token store did not answer within {after:?}.")]
	Timeout {
		/// Bound that elapsed.
		after: StdDuration,
	},
	/// A stored value could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
}
impl StoreError {
	/// Wraps any backend failure as [`StoreError::Unavailable`].
	pub fn unavailable(e: impl Display) -> Self {
		Self::Unavailable { message: e.to_string() }
	}
}
