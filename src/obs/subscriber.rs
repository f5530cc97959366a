// crates.io
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_DIRECTIVES: &str = "session_broker=info,tower_http=info";

/// Installs the global fmt subscriber, honoring `RUST_LOG` and falling back to
/// `default_directives`.
pub fn init_tracing(default_directives: &str) {
	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives)),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();
}
