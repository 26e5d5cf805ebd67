// self
use crate::_prelude::*;

/// GoHighLevel API version pinned in the `Version` header.
pub const GHL_API_VERSION: &str = "2021-07-28";

/// Provider-specific quirks that influence how flows and API calls behave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Extra `user_type` form field sent on every token request.
	pub user_type: Option<String>,
	/// Value of the `Version` header attached to REST calls.
	pub api_version: Option<String>,
}
impl ProviderQuirks {
	/// Quirks for GoHighLevel location-level apps.
	pub fn gohighlevel() -> Self {
		Self {
			scope_delimiter: ' ',
			user_type: Some("Location".into()),
			api_version: Some(GHL_API_VERSION.into()),
		}
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', user_type: None, api_version: None }
	}
}
