//! User records the user service signs up, logs in, and profiles.
//!
//! Only the contract and an in-memory directory live here; durable persistence is left to
//! whatever implements [`UserDirectory`] in a deployment.

pub mod memory;
pub mod password;

pub use memory::MemoryUserDirectory;

// self
use crate::_prelude::*;

/// Boxed future returned by every [`UserDirectory`] call.
pub type DirectoryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Storage contract for user records.
pub trait UserDirectory
where
	Self: Send + Sync,
{
	/// Stores a new user, hashing its password. Fails with [`Error::BadRequest`] when the email
	/// is already registered.
	fn insert(&self, user: NewUser) -> DirectoryFuture<'_, UserRecord>;

	/// Looks up a user by email.
	fn find<'a>(&'a self, email: &'a Owner) -> DirectoryFuture<'a, Option<UserRecord>>;

	/// `true` only when the email exists and `password` matches its stored hash.
	fn verify_credentials<'a>(
		&'a self,
		email: &'a Owner,
		password: &'a str,
	) -> DirectoryFuture<'a, bool>;
}

/// Account lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
	/// Able to log in.
	#[default]
	Active,
	/// Kept on record but not expected to log in.
	Disabled,
}

/// Signup payload.
#[derive(Clone, Deserialize)]
pub struct NewUser {
	/// Login email.
	pub email: Owner,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Plain-text password; hashed before storage.
	pub password: String,
}
impl NewUser {
	/// Rejects blank names and passwords with a field-level [`Error::BadRequest`].
	pub fn validate(&self) -> Result<()> {
		for (field, value) in [
			("first_name", &self.first_name),
			("last_name", &self.last_name),
			("password", &self.password),
		] {
			if value.trim().is_empty() {
				return Err(Error::bad_request(format!("{field}: must not be empty")));
			}
		}

		Ok(())
	}
}
impl Debug for NewUser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NewUser")
			.field("email", &self.email)
			.field("first_name", &self.first_name)
			.field("last_name", &self.last_name)
			.finish_non_exhaustive()
	}
}

/// Stored user as exposed to clients. The password hash never appears here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	/// Sequential identifier.
	pub id: u64,
	/// Login email.
	pub email: Owner,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Lifecycle state.
	pub status: UserStatus,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Last modification instant.
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}
