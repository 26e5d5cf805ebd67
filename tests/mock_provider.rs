// self
use ghl_bridge::{
	auth::ProviderId,
	provider::{
		ClientAuthMethod, GHL_API_BASE_URL, GHL_AUTHORIZE_URL, GHL_TOKEN_URL, GrantType,
		ProviderDescriptor, ProviderDescriptorBuilder, ProviderDescriptorError, ProviderQuirks,
	},
	url::Url,
};

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse mock provider URL.")
}

fn builder(id: &str) -> ProviderDescriptorBuilder {
	let provider_id =
		ProviderId::new(id).expect("Failed to build provider identifier for mock descriptor.");

	ProviderDescriptor::builder(provider_id)
}

#[test]
fn descriptor_rejects_insecure_endpoints_and_missing_grants() {
	let err = builder("mock-insecure")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.api_base(url("https://example.com/"))
		.build()
		.expect_err("Descriptor builder should reject missing grants.");

	assert!(matches!(err, ProviderDescriptorError::NoSupportedGrants));

	let err = builder("mock")
		.authorization_endpoint(url("http://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.api_base(url("https://example.com/"))
		.support_grant(GrantType::AuthorizationCode)
		.build()
		.expect_err("Descriptor builder should reject insecure authorization endpoints.");

	assert!(matches!(
		err,
		ProviderDescriptorError::InsecureEndpoint { endpoint: "authorization", .. }
	));
}

#[test]
fn gohighlevel_descriptor_targets_production_endpoints() {
	let descriptor =
		ProviderDescriptor::gohighlevel().expect("Production descriptor should build.");

	assert_eq!(descriptor.endpoints.authorization.as_str(), GHL_AUTHORIZE_URL);
	assert_eq!(descriptor.endpoints.token.as_str(), GHL_TOKEN_URL);
	assert_eq!(descriptor.endpoints.api_base.as_str(), GHL_API_BASE_URL);
	assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
	assert_eq!(descriptor.quirks, ProviderQuirks::gohighlevel());
	assert_eq!(descriptor.quirks.api_version.as_deref(), Some("2021-07-28"));
}

#[test]
fn quirks_reject_control_delimiters() {
	let err = builder("mock-quirks")
		.authorization_endpoint(url("https://example.com/auth"))
		.token_endpoint(url("https://example.com/token"))
		.api_base(url("https://example.com/"))
		.support_grant(GrantType::RefreshToken)
		.quirks(ProviderQuirks { scope_delimiter: '\n', ..ProviderQuirks::default() })
		.build()
		.expect_err("Control-character delimiters must be rejected.");

	assert_eq!(err, ProviderDescriptorError::InvalidScopeDelimiter { delimiter: '\n' });
}
