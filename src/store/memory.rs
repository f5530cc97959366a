//! Thread-safe in-memory [`TokenStore`] for single-process deployments, development, and tests.

// self
use crate::{
	_prelude::*,
	auth::SessionToken,
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<Owner, SessionToken>>>;

/// Storage backend that keeps secrets in-process.
///
/// Clones share the same map. Expired entries are invisible to readers and are replaced by the
/// next set-if-absent write for their owner.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of entries that are live right now.
	pub fn live_entries(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|stored| !stored.is_expired_at(now)).count()
	}

	fn get_now(map: &StoreMap, owner: &Owner, now: OffsetDateTime) -> Option<TokenSecret> {
		map.read().get(owner).filter(|stored| !stored.is_expired_at(now)).map(|s| s.secret.clone())
	}

	fn set_if_absent_now(
		map: &StoreMap,
		owner: &Owner,
		secret: &TokenSecret,
		ttl: Duration,
		now: OffsetDateTime,
	) -> bool {
		let mut guard = map.write();

		if guard.get(owner).is_some_and(|stored| !stored.is_expired_at(now)) {
			return false;
		}

		let token = SessionToken::new(owner.to_owned(), secret.to_owned(), now, ttl);

		guard.insert(owner.to_owned(), token);

		true
	}

	fn delete_now(map: &StoreMap, owner: &Owner) {
		map.write().remove(owner);
	}
}
impl TokenStore for MemoryStore {
	fn get<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, owner, OffsetDateTime::now_utc())) })
	}

	fn set_if_absent<'a>(
		&'a self,
		owner: &'a Owner,
		secret: &'a TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			Ok(Self::set_if_absent_now(&self.0, owner, secret, ttl, OffsetDateTime::now_utc()))
		})
	}

	fn delete<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::delete_now(&self.0, owner);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn owner() -> Owner {
		Owner::new("a@x.com").expect("Owner fixture should be valid.")
	}

	#[test]
	fn expired_entries_are_absent_and_replaceable() {
		let map = StoreMap::default();
		let owner = owner();
		let now = OffsetDateTime::now_utc();

		assert!(MemoryStore::set_if_absent_now(
			&map,
			&owner,
			&TokenSecret::new("first"),
			Duration::minutes(5),
			now,
		));
		assert!(!MemoryStore::set_if_absent_now(
			&map,
			&owner,
			&TokenSecret::new("second"),
			Duration::minutes(5),
			now + Duration::minutes(1),
		));

		let later = now + Duration::minutes(5);

		assert!(MemoryStore::get_now(&map, &owner, later).is_none());
		assert!(MemoryStore::set_if_absent_now(
			&map,
			&owner,
			&TokenSecret::new("third"),
			Duration::minutes(5),
			later,
		));
		assert_eq!(
			MemoryStore::get_now(&map, &owner, later).as_ref().map(TokenSecret::expose),
			Some("third")
		);
	}

	#[test]
	fn delete_is_idempotent() {
		let map = StoreMap::default();
		let owner = owner();

		MemoryStore::delete_now(&map, &owner);
		MemoryStore::delete_now(&map, &owner);

		assert!(map.read().is_empty());
	}
}
