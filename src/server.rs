//! HTTP surface: shared state, the axum router, and the listener loop.

pub mod error;
pub mod pages;
pub mod routes;

// crates.io
use axum::Router;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	config::Config,
	crm::CrmClient,
	error::ConfigError,
	flows::TokenManager,
	http::ReqwestHttpClient,
	store::{MemoryStore, TokenStore},
	usage::UsageTracker,
};

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
	/// Loaded configuration.
	pub config: Config,
	/// Token lifecycle manager.
	pub manager: TokenManager,
	/// CRM REST client.
	pub crm: CrmClient,
	/// Usage counter service.
	pub usage: UsageTracker,
}
impl AppState {
	/// Wires the services for `config` over an in-memory token store.
	pub fn from_config(config: Config) -> Result<Self> {
		Self::with_store(config, Arc::new(MemoryStore::default()))
	}

	/// Wires the services for `config` over the provided token store.
	pub fn with_store(config: Config, store: Arc<dyn TokenStore>) -> Result<Self> {
		let http = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Self::with_http_client(config, store, http)
	}

	/// Wires the services over the provided token store and transport.
	pub fn with_http_client(
		config: Config,
		store: Arc<dyn TokenStore>,
		http: ReqwestHttpClient,
	) -> Result<Self> {
		let descriptor = config.descriptor().map_err(ConfigError::from)?;
		let manager = TokenManager::new(
			store,
			descriptor.clone(),
			config.client_id.clone(),
			config.redirect_uri.clone(),
		)
		.with_client_secret(config.client_secret.expose())
		.with_scope(config.scopes.clone())
		.with_http_client(http.clone());
		let crm = CrmClient::from_descriptor(&descriptor, http);
		let usage = UsageTracker::new(manager.clone(), crm.clone(), config.usage.clone());

		Ok(Self { config, manager, crm, usage })
	}
}

/// Shared handle passed to handlers.
pub type SharedState = Arc<AppState>;

/// Application router with request tracing.
pub fn router(state: SharedState) -> Router {
	routes::router(state).layer(TraceLayer::new_for_http())
}

/// Binds the configured address and serves until the listener fails.
pub async fn serve(config: Config) -> Result<()> {
	let addr = config.bind_addr()?;
	let state = Arc::new(AppState::from_config(config)?);
	let listener = tokio::net::TcpListener::bind(addr).await?;

	tracing::info!(
		%addr,
		redirect_uri = %state.config.redirect_uri,
		default_location = ?state.config.default_account,
		"ghl-bridge listening."
	);

	axum::serve(listener, router(state)).await?;

	Ok(())
}
