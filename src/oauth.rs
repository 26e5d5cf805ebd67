//! Token endpoint facade over the `oauth2` crate.
//!
//! [`BasicFacade`] owns a configured `oauth2` client plus the shared transport and turns token
//! endpoint outcomes into [`TokenRecord`] values or [`ProviderFailure`] payloads.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{AccountId, ScopeSet, TokenRecord},
	error::{ConfigError, ProviderFailure},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{ClientAuthMethod, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Outcome of a token endpoint call.
pub type FacadeResult<T> = std::result::Result<T, ProviderFailure>;

pub(crate) struct BasicFacade {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
	user_type: Option<String>,
}
impl BasicFacade {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		redirect_uri: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, user_type: descriptor.quirks.user_type.clone() })
	}

	/// Redeems an authorization code for `account`.
	pub(crate) async fn exchange_authorization_code(
		&self,
		account: &AccountId,
		code: &str,
		requested_scope: &ScopeSet,
	) -> FacadeResult<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(user_type) = &self.user_type {
			request = request.add_extra_param("user_type", user_type.clone());
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;
		let (record, _) = map_token_response(account, requested_scope, response)?;

		Ok(record)
	}

	/// Mints a new access token from `refresh_token`.
	///
	/// The second tuple element is the refresh token returned by the provider, if it rotated one.
	pub(crate) async fn refresh_token(
		&self,
		account: &AccountId,
		refresh_token: &str,
		requested_scope: &ScopeSet,
	) -> FacadeResult<(TokenRecord, Option<String>)> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		if let Some(user_type) = &self.user_type {
			request = request.add_extra_param("user_type", user_type.clone());
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		map_token_response(account, requested_scope, response)
	}
}

fn map_token_response(
	account: &AccountId,
	requested_scope: &ScopeSet,
	response: BasicTokenResponse,
) -> FacadeResult<(TokenRecord, Option<String>)> {
	let expires_in = response
		.expires_in()
		.ok_or_else(|| ProviderFailure::local("Token endpoint response omitted `expires_in`."))?
		.as_secs();
	let expires_in = i64::try_from(expires_in)
		.map_err(|_| ProviderFailure::local("Token endpoint returned an out-of-range `expires_in`."))?;

	if expires_in <= 0 {
		return Err(ProviderFailure::local("Token endpoint returned a non-positive `expires_in`."));
	}

	let scope = response
		.scopes()
		.and_then(|scopes| ScopeSet::new(scopes.iter().map(|scope| scope.as_ref())).ok())
		.unwrap_or_else(|| requested_scope.clone());
	let new_refresh = response.refresh_token().map(|token| token.secret().to_owned());
	let record = TokenRecord::builder(account.clone(), scope)
		.access_token(response.access_token().secret().to_owned())
		.maybe_refresh_token(new_refresh.clone())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(|e| ProviderFailure::local(e.to_string()))?;

	Ok((record, new_refresh))
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> ProviderFailure {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let payload = serde_json::to_string(&response)
				.unwrap_or_else(|_| response.error().to_string());

			ProviderFailure::upstream(status, payload)
		},
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) if inner.is_timeout() =>
			ProviderFailure::local("Request timed out while calling the token endpoint."),
		RequestTokenError::Request(error) => ProviderFailure::upstream(
			status,
			format!("HTTP client error occurred while calling the token endpoint: {error}."),
		),
		RequestTokenError::Parse(_, body) =>
			ProviderFailure::upstream(status, String::from_utf8_lossy(&body).into_owned()),
		RequestTokenError::Other(message) => ProviderFailure::upstream(
			status,
			format!("Token endpoint returned an unexpected response: {message}."),
		),
	}
}
