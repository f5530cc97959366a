//! Deadline wrapper bounding every call on an inner [`TokenStore`].

// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Default bound applied to store calls.
pub const DEFAULT_STORE_TIMEOUT: StdDuration = StdDuration::from_secs(3);

/// Wraps a store so an outage surfaces as [`StoreError::Timeout`] instead of a hung request.
pub struct TimeoutStore<S>
where
	S: ?Sized + TokenStore,
{
	inner: Arc<S>,
	limit: StdDuration,
}
impl<S> TimeoutStore<S>
where
	S: ?Sized + TokenStore,
{
	/// Wraps `inner`, bounding each call by `limit`.
	pub fn new(inner: impl Into<Arc<S>>, limit: StdDuration) -> Self {
		Self { inner: inner.into(), limit }
	}

	/// Bound applied to each call.
	pub fn limit(&self) -> StdDuration {
		self.limit
	}
}
impl<S> Clone for TimeoutStore<S>
where
	S: ?Sized + TokenStore,
{
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone(), limit: self.limit }
	}
}
impl<S> Debug for TimeoutStore<S>
where
	S: ?Sized + TokenStore,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TimeoutStore").field("limit", &self.limit).finish()
	}
}
impl<S> TokenStore for TimeoutStore<S>
where
	S: ?Sized + TokenStore,
{
	fn get<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>> {
		bounded(self.limit, self.inner.get(owner))
	}

	fn set_if_absent<'a>(
		&'a self,
		owner: &'a Owner,
		secret: &'a TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, bool> {
		bounded(self.limit, self.inner.set_if_absent(owner, secret, ttl))
	}

	fn delete<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, ()> {
		bounded(self.limit, self.inner.delete(owner))
	}
}

fn bounded<'a, T>(limit: StdDuration, fut: StoreFuture<'a, T>) -> StoreFuture<'a, T>
where
	T: 'a + Send,
{
	Box::pin(async move {
		match tokio::time::timeout(limit, fut).await {
			Ok(result) => result,
			Err(_) => Err(StoreError::Timeout { after: limit }),
		}
	})
}
