//! Token authority service: issues, validates, and revokes session secrets over HTTP.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
// self
#[cfg(feature = "redis")] use session_broker::{retry::RetryPolicy, store::RedisStore};
use session_broker::{
	authority::{TokenAuthority, server},
	config::{AuthorityConfig, StoreBackend},
	obs,
	store::{MemoryStore, TimeoutStore, TokenStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	dotenvy::dotenv().ok();
	obs::init_tracing(obs::DEFAULT_LOG_DIRECTIVES);

	let config = AuthorityConfig::from_env()?;

	tracing::info!(?config, "Starting the token authority.");

	let backend = connect_store(&config).await?;
	let store: Arc<dyn TokenStore> =
		Arc::new(TimeoutStore::<dyn TokenStore>::new(backend, config.store_timeout));
	let authority = TokenAuthority::new(store).with_ttl(config.session_ttl);
	let listener = TcpListener::bind(config.bind).await?;

	tracing::info!(addr = %listener.local_addr()?, "Token authority listening.");

	axum::serve(listener, server::router(Arc::new(authority)))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn connect_store(config: &AuthorityConfig) -> Result<Arc<dyn TokenStore>> {
	match &config.store {
		StoreBackend::Memory => {
			tracing::warn!("Using the in-process memory store; sessions are not shared.");

			Ok(Arc::new(MemoryStore::default()))
		},
		#[cfg(feature = "redis")]
		StoreBackend::Redis(url) => {
			let store = RetryPolicy::default()
				.run("token store", |_| async move {
					let store = RedisStore::connect(url, config.namespace.as_str()).await?;

					store.ping().await?;

					Ok::<_, session_broker::store::StoreError>(store)
				})
				.await?;

			tracing::info!(namespace = %config.namespace, "Connected to the Redis token store.");

			Ok(Arc::new(store))
		},
		#[cfg(not(feature = "redis"))]
		StoreBackend::Redis(_) => Err(session_broker::error::ConfigError::UnsupportedStore {
			scheme: "redis".into(),
		}
		.into()),
	}
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for the shutdown signal.");

		std::future::pending::<()>().await;
	}

	tracing::info!("Shutting down the token authority.");
}
