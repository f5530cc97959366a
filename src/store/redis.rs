//! Redis-backed [`TokenStore`] shared by every token authority process in a deployment.
//!
//! Each owner maps to the key `"{namespace}:{owner}"`. Set-if-absent is a single
//! `SET key value NX PX ttl` so Redis both enforces atomicity and expires the entry.

// crates.io
use redis::{Client, Cmd, Value, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Token store backed by a single logical Redis instance.
///
/// The connection manager is created once and cloned per call; it reconnects transparently at
/// the transport layer, so the store itself never retries.
#[derive(Clone)]
pub struct RedisStore {
	connection: ConnectionManager,
	namespace: String,
}
impl RedisStore {
	/// Namespace used when none is configured.
	pub const DEFAULT_NAMESPACE: &'static str = "userTokens";

	/// Opens a managed connection to `url`.
	pub async fn connect(url: &str, namespace: impl Into<String>) -> Result<Self, StoreError> {
		let client = Client::open(url).map_err(StoreError::unavailable)?;
		let connection = ConnectionManager::new(client).await.map_err(StoreError::unavailable)?;

		Ok(Self::with_connection(connection, namespace))
	}

	/// Wraps an existing connection manager.
	pub fn with_connection(connection: ConnectionManager, namespace: impl Into<String>) -> Self {
		Self { connection, namespace: namespace.into() }
	}

	/// Round-trips a `PING`, used by startup retry loops.
	pub async fn ping(&self) -> Result<(), StoreError> {
		let mut connection = self.connection.clone();
		let _: String =
			redis::cmd("PING").query_async(&mut connection).await.map_err(StoreError::unavailable)?;

		Ok(())
	}

	fn key(&self, owner: &Owner) -> String {
		storage_key(&self.namespace, owner)
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisStore").field("namespace", &self.namespace).finish()
	}
}
impl TokenStore for RedisStore {
	fn get<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, Option<TokenSecret>> {
		Box::pin(async move {
			let mut connection = self.connection.clone();
			let value: Option<String> = redis::cmd("GET")
				.arg(self.key(owner))
				.query_async(&mut connection)
				.await
				.map_err(StoreError::unavailable)?;

			Ok(value.map(TokenSecret::new))
		})
	}

	fn set_if_absent<'a>(
		&'a self,
		owner: &'a Owner,
		secret: &'a TokenSecret,
		ttl: Duration,
	) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut connection = self.connection.clone();
			let reply: Value = set_if_absent_cmd(&self.key(owner), secret, ttl)
				.query_async(&mut connection)
				.await
				.map_err(StoreError::unavailable)?;

			Ok(was_created(&reply))
		})
	}

	fn delete<'a>(&'a self, owner: &'a Owner) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut connection = self.connection.clone();
			let _: i64 = redis::cmd("DEL")
				.arg(self.key(owner))
				.query_async(&mut connection)
				.await
				.map_err(StoreError::unavailable)?;

			Ok(())
		})
	}
}

fn storage_key(namespace: &str, owner: &Owner) -> String {
	format!("{namespace}:{owner}")
}

/// Millisecond TTL for `PX`. Redis rejects non-positive values, so the floor is one.
fn ttl_millis(ttl: Duration) -> i64 {
	i64::try_from(ttl.whole_milliseconds()).unwrap_or(i64::MAX).max(1)
}

fn set_if_absent_cmd(key: &str, secret: &TokenSecret, ttl: Duration) -> Cmd {
	let mut cmd = redis::cmd("SET");

	cmd.arg(key).arg(secret.expose()).arg("NX").arg("PX").arg(ttl_millis(ttl));

	cmd
}

/// `SET ... NX` answers `OK` when it wrote and nil when the key already existed.
fn was_created(reply: &Value) -> bool {
	!matches!(reply, Value::Nil)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn resp(args: &[&str]) -> Vec<u8> {
		let mut packed = format!("*{}\r\n", args.len());

		for arg in args {
			packed.push_str(&format!("${}\r\n{arg}\r\n", arg.len()));
		}

		packed.into_bytes()
	}

	#[test]
	fn keys_are_namespaced_per_owner() {
		let owner = Owner::new("a@x.com").expect("Owner fixture should be valid.");

		assert_eq!(storage_key(RedisStore::DEFAULT_NAMESPACE, &owner), "userTokens:a@x.com");
		assert_eq!(storage_key("staging", &owner), "staging:a@x.com");
	}

	#[test]
	fn ttl_is_clamped_to_a_positive_millisecond_count() {
		assert_eq!(ttl_millis(Duration::hours(24)), 86_400_000);
		assert_eq!(ttl_millis(Duration::microseconds(10)), 1);
		assert_eq!(ttl_millis(Duration::seconds(-5)), 1);
		assert_eq!(ttl_millis(Duration::MAX), i64::MAX);
	}

	#[test]
	fn set_if_absent_is_a_single_set_nx_px() {
		let cmd =
			set_if_absent_cmd("userTokens:a@x.com", &TokenSecret::new("T"), Duration::seconds(2));

		assert_eq!(
			cmd.get_packed_command(),
			resp(&["SET", "userTokens:a@x.com", "T", "NX", "PX", "2000"])
		);
	}

	#[test]
	fn nil_replies_mean_the_key_already_existed() {
		assert!(was_created(&Value::Okay));
		assert!(!was_created(&Value::Nil));
	}
}
