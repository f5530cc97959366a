//! Session Gateway: turns logins into cookie-borne sessions and guards protected routes.
//!
//! The gateway holds no session state. Every decision is delegated to the token authority
//! through an [`AuthorityClient`], and nothing is retried: a failed call maps straight to the
//! caller-facing [`Error`] for that operation.

pub mod client;
pub mod cookie;
pub mod middleware;
pub mod routes;

pub use client::*;
pub use cookie::*;
pub use middleware::*;

// self
use crate::{
	_prelude::*,
	authority::Validation,
	obs::{self, OpKind},
};

/// Login/authenticate/logout orchestration over an [`AuthorityClient`].
pub struct SessionGateway<A = dyn AuthorityClient>
where
	A: ?Sized + AuthorityClient,
{
	authority: Arc<A>,
}
impl<A> SessionGateway<A>
where
	A: ?Sized + AuthorityClient,
{
	/// Wraps the client used to reach the token authority.
	pub fn new(authority: impl Into<Arc<A>>) -> Self {
		Self { authority: authority.into() }
	}

	/// Client used to reach the token authority.
	pub fn authority(&self) -> &A {
		&self.authority
	}

	/// Obtains the owner's session secret once credentials have been verified.
	///
	/// Any authority failure maps to [`Error::Forbidden`].
	pub async fn login(&self, email: &Owner) -> Result<SessionCookies> {
		obs::observe(OpKind::Login, "login", email, async {
			let token = self.authority.issue(email).await.map_err(|e| {
				tracing::warn!(error = %e, "Token authority declined to issue a session.");

				Error::Forbidden { reason: e.to_string() }
			})?;

			Ok(SessionCookies::new(email.clone(), token))
		})
		.await
	}

	/// Admits a request only when both session cookies are present and the authority
	/// confirms them.
	///
	/// Missing cookies are rejected without calling the authority. Mismatch, absence, and
	/// authority failures all map to [`Error::Unauthorized`].
	pub async fn authenticate(&self, cookies: Option<SessionCookies>) -> Result<Owner> {
		let Some(SessionCookies { email, token }) = cookies else {
			tracing::debug!("Rejected a request without session cookies.");

			return Err(Error::Unauthorized);
		};

		obs::observe(OpKind::Authenticate, "authenticate", &email, async {
			match self.authority.validate(&email, token.expose()).await {
				Ok(Validation::Valid) => Ok(email.clone()),
				Ok(validation) => {
					tracing::debug!(?validation, "Rejected a session the authority does not know.");

					Err(Error::Unauthorized)
				},
				Err(e) => {
					tracing::warn!(error = %e, "Token authority failed during authentication.");

					Err(Error::Unauthorized)
				},
			}
		})
		.await
	}

	/// Revokes the owner's session at the authority.
	///
	/// Any authority failure maps to [`Error::Internal`]; cookies should only be cleared on
	/// success.
	pub async fn logout(&self, email: &Owner) -> Result<()> {
		obs::observe(OpKind::Logout, "logout", email, async {
			self.authority
				.revoke(email)
				.await
				.map_err(|e| Error::Internal { reason: format!("session revocation failed: {e}") })
		})
		.await
	}
}
impl<A> Clone for SessionGateway<A>
where
	A: ?Sized + AuthorityClient,
{
	fn clone(&self) -> Self {
		Self { authority: self.authority.clone() }
	}
}
impl<A> Debug for SessionGateway<A>
where
	A: ?Sized + AuthorityClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionGateway").finish_non_exhaustive()
	}
}
