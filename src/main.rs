//! `ghl-bridge` binary: loads `.env`, installs tracing, and serves the HTTP surface.

// crates.io
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use ghl_bridge::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let dotenv = dotenvy::dotenv();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("ghl_bridge=info,tower_http=info")),
		)
		.init();

	if let Ok(path) = dotenv {
		tracing::debug!(path = %path.display(), "Loaded environment file.");
	}

	let config = Config::from_env()?;

	tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting ghl-bridge.");

	server::serve(config).await?;

	Ok(())
}
