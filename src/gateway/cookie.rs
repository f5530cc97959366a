//! Session cookie encoding.
//!
//! A session travels as two HttpOnly cookies: `email` carries the owner and `Authorization`
//! carries the raw secret. Both are set together on login and cleared together on logout.

// crates.io
use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use time::{UtcOffset, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::{SESSION_TTL, owner::is_cookie_octet},
};

/// Cookie carrying the session owner.
pub const EMAIL_COOKIE: &str = "email";
/// Cookie carrying the session secret.
pub const AUTHORIZATION_COOKIE: &str = "Authorization";

const CLEARED_EXPIRY: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Owner and secret pair read from, or written to, the session cookies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookies {
	/// Value of the `email` cookie.
	pub email: Owner,
	/// Value of the `Authorization` cookie.
	pub token: TokenSecret,
}
impl SessionCookies {
	/// Pairs an owner with its secret.
	pub fn new(email: Owner, token: TokenSecret) -> Self {
		Self { email, token }
	}

	/// Reads both session cookies from request headers.
	///
	/// Returns `None` when either cookie is missing or empty, or when `email` is not a valid
	/// owner.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let email = find_cookie(headers, EMAIL_COOKIE).filter(|v| !v.is_empty())?;
		let token = find_cookie(headers, AUTHORIZATION_COOKIE).filter(|v| !v.is_empty())?;

		Some(Self { email: Owner::new(email).ok()?, token: TokenSecret::new(token) })
	}

	/// `Set-Cookie` values establishing the session, expiring [`SESSION_TTL`] after `now`.
	pub fn set_cookie_headers(&self, now: OffsetDateTime) -> Result<[HeaderValue; 2]> {
		let expires = (now + SESSION_TTL)
			.to_offset(UtcOffset::UTC)
			.format(format_description!(
				"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
			))
			.map_err(|e| Error::Internal {
				reason: format!("cookie expiry formatting failed: {e}"),
			})?;
		let max_age = SESSION_TTL.whole_seconds();

		Ok([
			session_cookie(EMAIL_COOKIE, self.email.as_ref(), &expires, max_age)?,
			session_cookie(AUTHORIZATION_COOKIE, self.token.expose(), &expires, max_age)?,
		])
	}

	/// `Set-Cookie` values removing both session cookies.
	pub fn clear_cookie_headers() -> Result<[HeaderValue; 2]> {
		Ok([
			session_cookie(EMAIL_COOKIE, "", CLEARED_EXPIRY, 0)?,
			session_cookie(AUTHORIZATION_COOKIE, "", CLEARED_EXPIRY, 0)?,
		])
	}
}

fn session_cookie(name: &str, value: &str, expires: &str, max_age: i64) -> Result<HeaderValue> {
	if let Some(found) = value.chars().find(|c| !is_cookie_octet(*c)) {
		return Err(Error::Internal {
			reason: format!("cookie `{name}` value contains the disallowed character {found:?}"),
		});
	}

	HeaderValue::from_str(&format!(
		"{name}={value}; Expires={expires}; Max-Age={max_age}; Path=/; HttpOnly"
	))
	.map_err(|e| Error::Internal {
		reason: format!("cookie `{name}` is not a valid header value: {e}"),
	})
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value)
}
