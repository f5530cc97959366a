//! User service: signup, login, logout, and profile, with sessions held by the token authority.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use session_broker::{
	config::UserServiceConfig,
	gateway::{
		AuthorityClient, HttpAuthorityClient, SessionGateway,
		routes::{self, UserServiceState},
	},
	obs,
	retry::RetryPolicy,
	users::{MemoryUserDirectory, UserDirectory},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	dotenvy::dotenv().ok();
	obs::init_tracing(obs::DEFAULT_LOG_DIRECTIVES);

	let config = UserServiceConfig::from_env()?;

	tracing::info!(?config, "Starting the user service.");

	let client = HttpAuthorityClient::new(config.authority_url.clone(), config.authority_timeout)?;

	// The authority may still be starting; requests fail closed until it answers.
	if let Err(e) = RetryPolicy::default().run("token authority", |_| client.ping()).await {
		tracing::warn!(error = %e, "Continuing without a reachable token authority.");
	}

	let authority: Arc<dyn AuthorityClient> = Arc::new(client);
	let users: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::default());
	let state = UserServiceState { gateway: Arc::new(SessionGateway::new(authority)), users };
	let listener = TcpListener::bind(config.bind).await?;

	tracing::info!(addr = %listener.local_addr()?, "User service listening.");

	axum::serve(listener, routes::router(state)).with_graceful_shutdown(shutdown_signal()).await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for the shutdown signal.");

		std::future::pending::<()>().await;
	}

	tracing::info!("Shutting down the user service.");
}
