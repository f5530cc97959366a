//! Argon2id password hashing in PHC string format.

// crates.io
use argon2::{
	Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
	password_hash::{SaltString, rand_core::OsRng},
};
// self
use crate::_prelude::*;

/// Argon2id hasher with fixed parameters.
#[derive(Clone)]
pub struct PasswordHasher(Argon2<'static>);
impl PasswordHasher {
	/// Hasher using explicit cost parameters.
	pub fn with_params(params: Params) -> Self {
		Self(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
	}

	/// Hashes `password` under a fresh random salt.
	pub fn hash(&self, password: &str) -> Result<String> {
		let salt = SaltString::generate(&mut OsRng);

		self.0
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| Error::Internal { reason: format!("password hashing failed: {e}") })
	}

	/// `true` when `password` matches the PHC string `hash`.
	///
	/// A malformed stored hash is an internal error, not a mismatch.
	pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
		let parsed = PasswordHash::new(hash)
			.map_err(|e| Error::Internal {
				reason: format!("stored password hash is invalid: {e}"),
			})?;

		Ok(self.0.verify_password(password.as_bytes(), &parsed).is_ok())
	}
}
impl Default for PasswordHasher {
	fn default() -> Self {
		Self::with_params(Params::default())
	}
}
impl Debug for PasswordHasher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PasswordHasher(argon2id)")
	}
}
