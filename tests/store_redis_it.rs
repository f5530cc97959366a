//! Runs against the Redis named by `REDIS_URL`; every test is a no-op when it is unset.

// crates.io
use tokio::sync::Barrier;
// self
use session_broker::{
	_preludet::*,
	store::{RedisStore, TokenStore},
};

async fn connect() -> Option<RedisStore> {
	let Ok(url) = std::env::var("REDIS_URL") else {
		eprintln!("REDIS_URL is unset; skipping the Redis store checks.");

		return None;
	};
	// A fresh namespace per test keeps runs independent of leftovers.
	let namespace = format!("session-broker-it-{}", TokenSecret::generate().expose());
	let store =
		RedisStore::connect(&url, namespace).await.expect("REDIS_URL should accept connections.");

	store.ping().await.expect("Redis should answer PING.");

	Some(store)
}

#[tokio::test]
async fn set_if_absent_keeps_the_first_writer() {
	let Some(store) = connect().await else { return };
	let owner = owner("a@x.com");
	let first = TokenSecret::new("first");

	assert!(
		store
			.set_if_absent(&owner, &first, Duration::hours(1))
			.await
			.expect("First write should succeed.")
	);
	assert!(
		!store
			.set_if_absent(&owner, &TokenSecret::new("second"), Duration::hours(1))
			.await
			.expect("Losing write should still succeed.")
	);
	assert_eq!(store.get(&owner).await.expect("Fetch should succeed."), Some(first));

	store.delete(&owner).await.expect("Cleanup should succeed.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_produce_a_single_winner() {
	const WRITERS: usize = 16;

	let Some(store) = connect().await else { return };
	let owner = owner("race@x.com");
	let start = Arc::new(Barrier::new(WRITERS));
	let mut handles = Vec::new();

	for i in 0..WRITERS {
		let store = store.clone();
		let owner = owner.clone();
		let start = start.clone();

		handles.push(tokio::spawn(async move {
			let candidate = TokenSecret::new(format!("candidate-{i}"));

			start.wait().await;
			store
				.set_if_absent(&owner, &candidate, Duration::hours(1))
				.await
				.expect("Concurrent writes should succeed.")
		}));
	}

	let mut winners = 0;

	for handle in handles {
		if handle.await.expect("Writer task should not panic.") {
			winners += 1;
		}
	}

	assert_eq!(winners, 1);

	store.delete(&owner).await.expect("Cleanup should succeed.");
}

#[tokio::test]
async fn entries_expire_and_delete_is_idempotent() {
	let Some(store) = connect().await else { return };
	let owner = owner("ttl@x.com");

	store
		.set_if_absent(&owner, &TokenSecret::new("short"), Duration::milliseconds(50))
		.await
		.expect("Short-lived write should succeed.");
	tokio::time::sleep(StdDuration::from_millis(150)).await;

	assert!(store.get(&owner).await.expect("Fetch should succeed.").is_none());

	store
		.set_if_absent(&owner, &TokenSecret::new("fresh"), Duration::hours(1))
		.await
		.expect("Rewrite after expiry should succeed.");
	store.delete(&owner).await.expect("First delete should succeed.");
	store.delete(&owner).await.expect("Second delete should succeed.");

	assert!(store.get(&owner).await.expect("Fetch should succeed.").is_none());
}
