//! Provider descriptor data structures and helpers shared by all flows.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant helpers wired into provider descriptors.
pub mod grant;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

/// GoHighLevel consent screen (location chooser).
pub const GHL_AUTHORIZE_URL: &str = "https://marketplace.gohighlevel.com/oauth/chooselocation";
/// GoHighLevel token endpoint.
pub const GHL_TOKEN_URL: &str = "https://services.leadconnectorhq.com/oauth/token";
/// GoHighLevel REST API base.
pub const GHL_API_BASE_URL: &str = "https://services.leadconnectorhq.com/";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Consent screen users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Base URL for authenticated REST calls.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by flows and the CRM client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Production GoHighLevel descriptor.
	pub fn gohighlevel() -> Result<Self, ProviderDescriptorError> {
		Self::gohighlevel_at(GHL_AUTHORIZE_URL, GHL_TOKEN_URL, GHL_API_BASE_URL)
	}

	/// GoHighLevel descriptor with overridden endpoints (staging, mocks).
	pub fn gohighlevel_at(
		authorization: &str,
		token: &str,
		api_base: &str,
	) -> Result<Self, ProviderDescriptorError> {
		let parse = |endpoint: &'static str, raw: &str| {
			Url::parse(raw).map_err(|e| ProviderDescriptorError::InvalidUrl {
				endpoint,
				reason: e.to_string(),
			})
		};
		let id = ProviderId::new("gohighlevel").map_err(|e| ProviderDescriptorError::InvalidUrl {
			endpoint: "id",
			reason: e.to_string(),
		})?;

		Self::builder(id)
			.authorization_endpoint(parse("authorization", authorization)?)
			.token_endpoint(parse("token", token)?)
			.api_base(parse("api_base", api_base)?)
			.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.quirks(ProviderQuirks::gohighlevel())
			.build()
	}

	/// Checks whether the descriptor supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn production_descriptor_is_valid() {
		let descriptor =
			ProviderDescriptor::gohighlevel().expect("Production descriptor should build.");

		assert!(descriptor.supports(GrantType::AuthorizationCode));
		assert!(descriptor.supports(GrantType::RefreshToken));
		assert_eq!(descriptor.endpoints.token.as_str(), GHL_TOKEN_URL);
		assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert_eq!(descriptor.quirks.user_type.as_deref(), Some("Location"));
	}

	#[test]
	fn overridden_endpoints_must_parse() {
		let err = ProviderDescriptor::gohighlevel_at("not a url", GHL_TOKEN_URL, GHL_API_BASE_URL)
			.expect_err("Unparsable endpoints must be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InvalidUrl { endpoint: "authorization", .. }));
	}
}
