//! Token Authority: issues, validates, and revokes one opaque session secret per owner.
//!
//! The authority keeps no state of its own. All coordination between concurrent issuers, in
//! this process or in others sharing the backend, happens through
//! [`TokenStore::set_if_absent`]. Losing that race is not an error: the authority reads the
//! winner back and returns it, so every concurrent caller for one owner converges on the same
//! secret.

pub mod server;

// self
use crate::{
	_prelude::*,
	auth::SESSION_TTL,
	obs::{self, OpKind},
	store::TokenStore,
};

/// Upper bound on write/read-back rounds before [`TokenAuthority::issue`] gives up.
///
/// A read-back only comes up empty when the winning entry expired or was revoked between the
/// two calls, so a handful of rounds is plenty.
pub const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Outcome of [`TokenAuthority::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
	/// The presented token is the owner's live secret.
	Valid,
	/// A live secret exists but differs from the presented token.
	Mismatch,
	/// No live secret exists for the owner.
	Absent,
}
impl Validation {
	/// `true` only for [`Validation::Valid`].
	pub fn is_valid(self) -> bool {
		matches!(self, Self::Valid)
	}
}

/// Result of a successful [`TokenAuthority::issue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
	/// Owner the secret belongs to.
	pub owner: Owner,
	/// The owner's live secret.
	pub secret: TokenSecret,
	/// `true` when this call wrote the secret, `false` when an existing one was reused.
	pub created: bool,
}

/// Stateless front over a [`TokenStore`].
#[derive(Clone)]
pub struct TokenAuthority {
	store: Arc<dyn TokenStore>,
	ttl: Duration,
}
impl TokenAuthority {
	/// Creates an authority issuing secrets with the default [`SESSION_TTL`].
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store, ttl: SESSION_TTL }
	}

	/// Overrides the lifetime applied to newly issued secrets.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = ttl;

		self
	}

	/// Lifetime applied to newly issued secrets.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Returns the owner's live secret, creating one when none exists.
	///
	/// Idempotent while a secret is live: repeat calls return the same value. Fails only when
	/// the store is unavailable, or when the winning entry keeps disappearing before it can be
	/// read back.
	pub async fn issue(&self, owner: &Owner) -> Result<IssuedToken> {
		obs::observe(OpKind::Issue, "issue", owner, self.issue_inner(owner)).await
	}

	async fn issue_inner(&self, owner: &Owner) -> Result<IssuedToken> {
		for attempt in 1..=MAX_ISSUE_ATTEMPTS {
			let candidate = TokenSecret::generate();

			if self.store.set_if_absent(owner, &candidate, self.ttl).await? {
				tracing::info!(attempt, "Issued a new session secret.");

				return Ok(IssuedToken { owner: owner.clone(), secret: candidate, created: true });
			}
			if let Some(active) = self.store.get(owner).await? {
				tracing::debug!(attempt, "Reusing the live session secret.");

				return Ok(IssuedToken { owner: owner.clone(), secret: active, created: false });
			}

			tracing::warn!(attempt, "Live session vanished before it could be read back.");
		}

		Err(Error::Internal {
			reason: format!("no stable session secret after {MAX_ISSUE_ATTEMPTS} attempts"),
		})
	}

	/// Checks `presented` against the owner's live secret.
	///
	/// Comparison is exact and case-sensitive. An empty `presented` never matches.
	pub async fn validate(&self, owner: &Owner, presented: &str) -> Result<Validation> {
		obs::observe(OpKind::Validate, "validate", owner, async {
			let validation = match self.store.get(owner).await? {
				Some(live) if !presented.is_empty() && live.matches(presented) => Validation::Valid,
				Some(_) => Validation::Mismatch,
				None => Validation::Absent,
			};

			tracing::debug!(?validation, "Validated a presented session secret.");

			Ok(validation)
		})
		.await
	}

	/// Removes the owner's secret. Succeeds when nothing was stored.
	pub async fn revoke(&self, owner: &Owner) -> Result<()> {
		obs::observe(OpKind::Revoke, "revoke", owner, async {
			self.store.delete(owner).await?;

			tracing::info!("Revoked the session secret.");

			Ok(())
		})
		.await
	}
}
impl Debug for TokenAuthority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAuthority").field("ttl", &self.ttl).finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::store::{MemoryStore, StoreError, StoreFuture};

	fn owner() -> Owner {
		Owner::new("a@x.com").expect("Owner fixture should be valid.")
	}

	/// Reports every write as lost and never has anything to read back.
	#[derive(Default)]
	struct VanishingStore {
		writes: AtomicUsize,
	}
	impl TokenStore for VanishingStore {
		fn get<'a>(&'a self, _owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>> {
			Box::pin(async { Ok(None) })
		}

		fn set_if_absent<'a>(
			&'a self,
			_owner: &'a Owner,
			_secret: &'a TokenSecret,
			_ttl: Duration,
		) -> StoreFuture<'a, bool> {
			self.writes.fetch_add(1, Ordering::SeqCst);

			Box::pin(async { Ok(false) })
		}

		fn delete<'a>(&'a self, _owner: &'a Owner) -> StoreFuture<'a, ()> {
			Box::pin(async { Ok(()) })
		}
	}

	struct DownStore;
	impl TokenStore for DownStore {
		fn get<'a>(&'a self, _owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>> {
			Box::pin(async { Err(StoreError::unavailable("connection refused")) })
		}

		fn set_if_absent<'a>(
			&'a self,
			_owner: &'a Owner,
			_secret: &'a TokenSecret,
			_ttl: Duration,
		) -> StoreFuture<'a, bool> {
			Box::pin(async { Err(StoreError::unavailable("connection refused")) })
		}

		fn delete<'a>(&'a self, _owner: &'a Owner) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::unavailable("connection refused")) })
		}
	}

	#[tokio::test]
	async fn repeat_issue_returns_the_live_secret() {
		let authority = TokenAuthority::new(Arc::new(MemoryStore::default()));
		let first = authority.issue(&owner()).await.expect("First issue should succeed.");
		let second = authority.issue(&owner()).await.expect("Second issue should succeed.");

		assert!(first.created);
		assert!(!second.created);
		assert_eq!(first.secret, second.secret);
	}

	#[tokio::test]
	async fn empty_read_back_gives_up_after_bounded_attempts() {
		let store = Arc::new(VanishingStore::default());
		let authority = TokenAuthority::new(store.clone());
		let err = authority.issue(&owner()).await.expect_err("Issue must not loop forever.");

		assert!(matches!(err, Error::Internal { .. }));
		assert_eq!(store.writes.load(Ordering::SeqCst), MAX_ISSUE_ATTEMPTS);
	}

	#[tokio::test]
	async fn validate_distinguishes_mismatch_from_absence() {
		let authority = TokenAuthority::new(Arc::new(MemoryStore::default()));

		assert_eq!(
			authority.validate(&owner(), "anything").await.expect("Validate should succeed."),
			Validation::Absent
		);

		let issued = authority.issue(&owner()).await.expect("Issue should succeed.");

		assert_eq!(
			authority.validate(&owner(), "wrong").await.expect("Validate should succeed."),
			Validation::Mismatch
		);
		assert_eq!(
			authority.validate(&owner(), "").await.expect("Validate should succeed."),
			Validation::Mismatch
		);
		assert!(
			authority
				.validate(&owner(), issued.secret.expose())
				.await
				.expect("Validate should succeed.")
				.is_valid()
		);
	}

	#[tokio::test]
	async fn store_outages_propagate() {
		let authority = TokenAuthority::new(Arc::new(DownStore));

		assert!(matches!(authority.issue(&owner()).await, Err(Error::StoreUnavailable(_))));
		assert!(matches!(authority.validate(&owner(), "T").await, Err(Error::StoreUnavailable(_))));
		assert!(matches!(authority.revoke(&owner()).await, Err(Error::StoreUnavailable(_))));
	}

	#[tokio::test]
	async fn custom_ttl_is_applied_to_new_secrets() {
		let store = Arc::new(MemoryStore::default());
		let authority =
			TokenAuthority::new(store.clone()).with_ttl(Duration::milliseconds(30));

		assert_eq!(authority.ttl(), Duration::milliseconds(30));

		let first = authority.issue(&owner()).await.expect("Issue should succeed.");

		tokio::time::sleep(StdDuration::from_millis(60)).await;

		let expired = authority
			.validate(&owner(), first.secret.expose())
			.await
			.expect("Validate should succeed.");

		assert_eq!(expired, Validation::Absent);

		let second = authority.issue(&owner()).await.expect("Reissue should succeed.");

		assert!(second.created);
		assert_ne!(first.secret, second.secret);
	}
}
