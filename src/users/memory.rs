//! In-process [`UserDirectory`] for single-instance deployments and tests.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use argon2::Params;
// self
use crate::{
	_prelude::*,
	users::{
		DirectoryFuture, NewUser, UserDirectory, UserRecord, UserStatus, password::PasswordHasher,
	},
};

#[derive(Clone, Debug)]
struct StoredUser {
	record: UserRecord,
	password_hash: String,
}

/// Directory keeping users in a shared map. Hashing runs on the blocking pool.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserDirectory {
	users: Arc<RwLock<HashMap<Owner, StoredUser>>>,
	next_id: Arc<AtomicU64>,
	hasher: PasswordHasher,
}
impl MemoryUserDirectory {
	/// Directory hashing with explicit Argon2 cost parameters.
	pub fn with_params(params: Params) -> Self {
		Self { hasher: PasswordHasher::with_params(params), ..Default::default() }
	}

	/// Number of registered users.
	pub fn len(&self) -> usize {
		self.users.read().len()
	}

	/// `true` when nobody has signed up yet.
	pub fn is_empty(&self) -> bool {
		self.users.read().is_empty()
	}

	async fn hash_off_thread(&self, password: String) -> Result<String> {
		let hasher = self.hasher.clone();

		tokio::task::spawn_blocking(move || hasher.hash(&password))
			.await
			.map_err(|e| Error::Internal { reason: format!("password hashing task failed: {e}") })?
	}

	async fn verify_off_thread(&self, password: String, hash: String) -> Result<bool> {
		let hasher = self.hasher.clone();

		tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
			.await
			.map_err(|e| Error::Internal {
				reason: format!("password verification task failed: {e}"),
			})?
	}
}
impl UserDirectory for MemoryUserDirectory {
	fn insert(&self, user: NewUser) -> DirectoryFuture<'_, UserRecord> {
		Box::pin(async move {
			user.validate()?;

			if self.users.read().contains_key(&user.email) {
				return Err(Error::bad_request("email: already registered"));
			}

			let password_hash = self.hash_off_thread(user.password).await?;
			let now = OffsetDateTime::now_utc();
			let mut users = self.users.write();

			// Another signup for the same email may have landed while hashing.
			if users.contains_key(&user.email) {
				return Err(Error::bad_request("email: already registered"));
			}

			let record = UserRecord {
				id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
				email: user.email,
				first_name: user.first_name,
				last_name: user.last_name,
				status: UserStatus::Active,
				created_at: now,
				updated_at: now,
			};

			users.insert(record.email.clone(), StoredUser { record: record.clone(), password_hash });
			tracing::info!(id = record.id, "Registered a new user.");

			Ok(record)
		})
	}

	fn find<'a>(&'a self, email: &'a Owner) -> DirectoryFuture<'a, Option<UserRecord>> {
		Box::pin(async move { Ok(self.users.read().get(email).map(|stored| stored.record.clone())) })
	}

	fn verify_credentials<'a>(
		&'a self,
		email: &'a Owner,
		password: &'a str,
	) -> DirectoryFuture<'a, bool> {
		Box::pin(async move {
			let Some(hash) = self.users.read().get(email).map(|stored| stored.password_hash.clone())
			else {
				return Ok(false);
			};

			self.verify_off_thread(password.to_owned(), hash).await
		})
	}
}
