//! Process configuration loaded from environment variables.
//!
//! [`Config::from_env`] reads the process environment (the binary loads `.env` first);
//! [`Config::from_lookup`] accepts any key lookup so tests can inject values.

// std
use std::net::SocketAddr;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet, TokenSecret},
	error::ConfigError,
	provider::{
		GHL_API_BASE_URL, GHL_AUTHORIZE_URL, GHL_TOKEN_URL, ProviderDescriptor,
		ProviderDescriptorError,
	},
	usage::UsagePolicy,
};

/// Scopes requested on the consent screen unless `GHL_SCOPES` overrides them.
pub const DEFAULT_SCOPES: &str = "contacts.readonly contacts.write custom_values.readonly \
	custom_values.write opportunities.readonly opportunities.write tags.readonly tags.write \
	locations.readonly";
/// Redirect URI used unless `REDIRECT_URI` overrides it.
pub const DEFAULT_REDIRECT_URI: &str = "https://your-app.com/authorize-handler";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
	/// Interface the server binds to.
	pub host: String,
	/// Port the server binds to.
	pub port: u16,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested on the consent screen.
	pub scopes: ScopeSet,
	/// Account used when a request does not name one.
	pub default_account: Option<AccountId>,
	/// Substitute `default_account` when the callback omits `locationId`.
	pub callback_fallback: bool,
	/// Consent screen URL.
	pub authorize_url: String,
	/// Token endpoint URL.
	pub token_url: String,
	/// REST API base URL.
	pub api_base_url: String,
	/// Override for the `Version` header sent to the REST API.
	pub api_version: Option<String>,
	/// Timeout applied to every outbound call.
	pub http_timeout: std::time::Duration,
	/// Usage counter policy.
	pub usage: UsagePolicy,
}
impl Config {
	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through `lookup`; blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let required = |key: &'static str| var(key).ok_or(ConfigError::MissingVar { name: key });
		let redirect_uri = var("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.into());
		let scopes = var("GHL_SCOPES").unwrap_or_else(|| DEFAULT_SCOPES.into());
		let default_account = var("GHL_DEFAULT_LOCATION_ID")
			.map(AccountId::new)
			.transpose()
			.map_err(|e| ConfigError::invalid_var("GHL_DEFAULT_LOCATION_ID", e))?;

		Ok(Self {
			host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
			port: parse_or("PORT", var("PORT"), 3000)?,
			client_id: required("GHL_CLIENT_ID")?,
			client_secret: TokenSecret::new(required("GHL_CLIENT_SECRET")?),
			redirect_uri: Url::parse(&redirect_uri)
				.map_err(|e| ConfigError::invalid_var("REDIRECT_URI", e))?,
			scopes: ScopeSet::from_str(&scopes)
				.map_err(|e| ConfigError::invalid_var("GHL_SCOPES", e))?,
			default_account,
			callback_fallback: parse_or(
				"GHL_CALLBACK_FALLBACK",
				var("GHL_CALLBACK_FALLBACK"),
				false,
			)?,
			authorize_url: var("GHL_AUTHORIZE_URL").unwrap_or_else(|| GHL_AUTHORIZE_URL.into()),
			token_url: var("GHL_TOKEN_URL").unwrap_or_else(|| GHL_TOKEN_URL.into()),
			api_base_url: var("GHL_API_BASE_URL").unwrap_or_else(|| GHL_API_BASE_URL.into()),
			api_version: var("GHL_API_VERSION"),
			http_timeout: std::time::Duration::from_secs(parse_or(
				"HTTP_TIMEOUT_SECS",
				var("HTTP_TIMEOUT_SECS"),
				20,
			)?),
			usage: UsagePolicy {
				usage_field: var("USAGE_FIELD_ID"),
				limit_field: var("LIMIT_FIELD_ID"),
				default_limit: parse_or("SUBMISSION_LIMIT", var("SUBMISSION_LIMIT"), 10)?,
			},
		})
	}

	/// Provider descriptor for the configured endpoints.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let mut descriptor = ProviderDescriptor::gohighlevel_at(
			&self.authorize_url,
			&self.token_url,
			&self.api_base_url,
		)?;

		if let Some(version) = &self.api_version {
			descriptor.quirks.api_version = Some(version.clone());
		}

		Ok(descriptor)
	}

	/// Socket address the server binds to.
	pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
		format!("{}:{}", self.host, self.port)
			.parse()
			.map_err(|e| ConfigError::invalid_var("HOST", e))
	}
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
	T: FromStr,
	T::Err: Display,
{
	match raw {
		Some(raw) => raw.parse().map_err(|e| ConfigError::invalid_var(name, e)),
		None => Ok(default),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
		let vars = pairs
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn defaults_apply_when_only_credentials_are_set() {
		let config = load(&[("GHL_CLIENT_ID", "id"), ("GHL_CLIENT_SECRET", "secret")])
			.expect("Minimal configuration should load.");

		assert_eq!(config.port, 3000);
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.redirect_uri.as_str(), DEFAULT_REDIRECT_URI);
		assert_eq!(config.http_timeout, std::time::Duration::from_secs(20));
		assert_eq!(config.usage.default_limit, 10);
		assert_eq!(config.scopes.len(), 9);
		assert!(config.scopes.contains("locations.readonly"));
		assert!(!config.callback_fallback);
		assert!(config.default_account.is_none());
		assert_eq!(
			config.descriptor().expect("Default descriptor should build.").endpoints.token.as_str(),
			GHL_TOKEN_URL
		);
	}

	#[test]
	fn missing_and_invalid_values_are_reported() {
		let missing = load(&[("GHL_CLIENT_ID", "id"), ("GHL_CLIENT_SECRET", "  ")])
			.expect_err("Blank secrets count as unset.");
		let invalid = load(&[("GHL_CLIENT_ID", "id"), ("GHL_CLIENT_SECRET", "s"), ("PORT", "x")])
			.expect_err("Non-numeric ports must be rejected.");

		assert!(matches!(missing, ConfigError::MissingVar { name: "GHL_CLIENT_SECRET" }));
		assert!(matches!(invalid, ConfigError::InvalidVar { name: "PORT", .. }));
	}

	#[test]
	fn api_version_override_reaches_the_descriptor() {
		let config = load(&[
			("GHL_CLIENT_ID", "id"),
			("GHL_CLIENT_SECRET", "secret"),
			("GHL_API_VERSION", "2099-01-01"),
			("HOST", "127.0.0.1"),
			("PORT", "8080"),
		])
		.expect("Configuration should load.");
		let descriptor = config.descriptor().expect("Descriptor should build.");

		assert_eq!(descriptor.quirks.api_version.as_deref(), Some("2099-01-01"));
		assert_eq!(
			config.bind_addr().expect("Bind address should parse.").to_string(),
			"127.0.0.1:8080"
		);
	}
}
