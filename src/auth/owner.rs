//! Strongly typed owner identity used as the token-store key.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const OWNER_MAX_LEN: usize = 254;
const FINGERPRINT_LEN: usize = 12;

/// Error returned when owner validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum OwnerError {
	/// The owner was empty.
	#[error("email cannot be empty")]
	Empty,
	/// The owner contains whitespace characters.
	#[error("email contains whitespace")]
	ContainsWhitespace,
	/// The owner exceeded the allowed length.
	#[error("email exceeds {max} characters")]
	TooLong {
		/// Maximum permitted byte length.
		max: usize,
	},
	/// The owner contains a character that cannot appear in a cookie value.
	#[error("email contains the disallowed character {found:?}")]
	InvalidCharacter {
		/// First offending character.
		found: char,
	},
	/// The owner is not shaped like `local@domain`.
	#[error("email must look like local@domain")]
	NotAnEmail,
}

/// User identity (an email address) that owns at most one live session token.
///
/// Validation is deliberately shallow: non-empty, no whitespace, bounded length, only RFC 6265
/// cookie octets, and a single `@` separating non-empty parts. Comparison is exact, so
/// `A@x.com` and `a@x.com` are distinct owners.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(String);
impl Owner {
	/// Creates a new owner after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, OwnerError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Short, stable digest of the owner suitable for logs.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut encoded = STANDARD_NO_PAD.encode(digest);

		encoded.truncate(FINGERPRINT_LEN);

		encoded
	}
}
impl Deref for Owner {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Owner {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Owner {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Owner> for String {
	fn from(value: Owner) -> Self {
		value.0
	}
}
impl TryFrom<String> for Owner {
	type Error = OwnerError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for Owner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Owner({})", self.0)
	}
}
impl Display for Owner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for Owner {
	type Err = OwnerError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), OwnerError> {
	if view.is_empty() {
		return Err(OwnerError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(OwnerError::ContainsWhitespace);
	}
	if view.len() > OWNER_MAX_LEN {
		return Err(OwnerError::TooLong { max: OWNER_MAX_LEN });
	}
	if let Some(found) = view.chars().find(|c| !is_cookie_octet(*c)) {
		return Err(OwnerError::InvalidCharacter { found });
	}

	match view.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
			Ok(()),
		_ => Err(OwnerError::NotAnEmail),
	}
}

/// `true` for characters RFC 6265 allows unquoted in a cookie value.
pub(crate) fn is_cookie_octet(c: char) -> bool {
	matches!(c, '\x21' | '\x23'..='\x2B' | '\x2D'..='\x3A' | '\x3C'..='\x5B' | '\x5D'..='\x7E')
}
