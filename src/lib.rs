//! Session-token sidecar: a cache-backed token authority that issues, validates, and revokes
//! opaque session secrets, plus the cookie-driven session gateway a user-facing service uses to
//! talk to it.

#![deny(clippy::all, missing_docs)]

pub mod auth;
pub mod authority;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod protocol;
pub mod retry;
pub mod store;
pub mod users;

#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// crates.io
	use tokio::{net::TcpListener, task::JoinHandle};
	// self
	use crate::{
		authority::{TokenAuthority, server},
		store::{MemoryStore, TokenStore},
		users::MemoryUserDirectory,
	};

	/// Builds an authority over a fresh [`MemoryStore`] and hands both back so tests can inspect
	/// the store directly.
	pub fn build_memory_authority() -> (TokenAuthority, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();

		(TokenAuthority::new(store), store_backend)
	}

	/// Parses a fixture owner, panicking on invalid input.
	pub fn owner(value: &str) -> Owner {
		Owner::new(value).expect("Owner fixture should be valid.")
	}

	/// Serves the authority router on an ephemeral local port.
	pub async fn spawn_authority(authority: TokenAuthority) -> (Url, JoinHandle<()>) {
		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind an ephemeral port for the authority.");
		let addr = listener.local_addr().expect("Bound listener should expose its address.");
		let app = server::router(Arc::new(authority));
		let handle = tokio::spawn(async move {
			axum::serve(listener, app).await.expect("Authority test server should keep serving.");
		});
		let base = Url::parse(&format!("http://{addr}/"))
			.expect("Loopback authority URL should parse successfully.");

		(base, handle)
	}

	/// Returns an empty user directory with cheap Argon2 parameters.
	pub fn memory_directory() -> Arc<MemoryUserDirectory> {
		let params = argon2::Params::new(1024, 1, 1, None)
			.expect("Cheap Argon2 parameters should be valid.");

		Arc::new(MemoryUserDirectory::with_params(params))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::{
		auth::{Owner, TokenSecret},
		error::{Error, Result},
	};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
