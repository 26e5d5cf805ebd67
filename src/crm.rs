//! Authenticated client for the GoHighLevel REST API.
//!
//! Every call carries the bearer access token, the pinned `Version` header, and
//! `Accept: application/json`. Non-2xx answers become [`DownstreamError::Status`] with the raw
//! body; bodies that do not match the expected shape become [`DownstreamError::Decode`] naming
//! the JSON path that failed.

pub mod model;

pub use model::*;

// crates.io
use reqwest::{Method, RequestBuilder, header::ACCEPT};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{ContactId, TokenSecret},
	error::DownstreamError,
	http::ReqwestHttpClient,
	provider::ProviderDescriptor,
};

/// Result alias for CRM calls.
pub type CrmResult<T> = std::result::Result<T, DownstreamError>;

/// GoHighLevel REST client bound to one API base.
#[derive(Clone)]
pub struct CrmClient {
	http: ReqwestHttpClient,
	base: Url,
	api_version: Option<String>,
}
impl CrmClient {
	/// Creates a client for `base` without a `Version` header.
	pub fn new(http: ReqwestHttpClient, base: Url) -> Self {
		Self { http, base, api_version: None }
	}

	/// Creates a client using the descriptor's API base and version quirk.
	pub fn from_descriptor(descriptor: &ProviderDescriptor, http: ReqwestHttpClient) -> Self {
		Self {
			http,
			base: descriptor.endpoints.api_base.clone(),
			api_version: descriptor.quirks.api_version.clone(),
		}
	}

	/// Overrides the `Version` header value.
	pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = Some(version.into());

		self
	}

	/// Fetches a location profile.
	pub async fn location(&self, token: &TokenSecret, location_id: &str) -> CrmResult<Location> {
		const ENDPOINT: &str = "locations.get";

		let url = self.endpoint(&["locations", location_id])?;
		let envelope: LocationEnvelope =
			self.send(ENDPOINT, self.request(Method::GET, url, token)).await?;

		Ok(envelope.location)
	}

	/// Finds the contact registered under `email` in a location, if any.
	pub async fn find_contact_by_email(
		&self,
		token: &TokenSecret,
		location_id: &str,
		email: &str,
	) -> CrmResult<Option<Contact>> {
		const ENDPOINT: &str = "contacts.search_duplicate";

		let mut url = self.endpoint(&["contacts", "search", "duplicate"])?;

		url.query_pairs_mut().append_pair("locationId", location_id).append_pair("email", email);

		let lookup: ContactLookup =
			self.send(ENDPOINT, self.request(Method::GET, url, token)).await?;

		Ok(lookup.contact)
	}

	/// Fetches a contact by id.
	pub async fn contact(&self, token: &TokenSecret, contact_id: &ContactId) -> CrmResult<Contact> {
		const ENDPOINT: &str = "contacts.get";

		let url = self.endpoint(&["contacts", contact_id.as_ref()])?;
		let envelope: ContactEnvelope =
			self.send(ENDPOINT, self.request(Method::GET, url, token)).await?;

		Ok(envelope.contact)
	}

	/// Creates a contact, or updates the one sharing its email.
	pub async fn upsert_contact(
		&self,
		token: &TokenSecret,
		upsert: &ContactUpsert,
	) -> CrmResult<UpsertedContact> {
		const ENDPOINT: &str = "contacts.upsert";

		let url = self.endpoint(&["contacts", "upsert"])?;

		self.send(ENDPOINT, self.request(Method::POST, url, token).json(upsert)).await
	}

	/// Writes custom field values on a contact.
	pub async fn update_custom_fields(
		&self,
		token: &TokenSecret,
		contact_id: &ContactId,
		fields: &[CustomFieldUpdate],
	) -> CrmResult<Contact> {
		const ENDPOINT: &str = "contacts.update";

		let url = self.endpoint(&["contacts", contact_id.as_ref()])?;
		let body = serde_json::json!({ "customFields": fields });
		let envelope: ContactEnvelope =
			self.send(ENDPOINT, self.request(Method::PUT, url, token).json(&body)).await?;

		Ok(envelope.contact)
	}

	fn endpoint(&self, segments: &[&str]) -> CrmResult<Url> {
		let mut url = self.base.clone();

		url.path_segments_mut()
			.map_err(|_| DownstreamError::InvalidBase { base: self.base.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	fn request(&self, method: Method, url: Url, token: &TokenSecret) -> RequestBuilder {
		let builder = self
			.http
			.request(method, url)
			.bearer_auth(token.expose())
			.header(ACCEPT, "application/json");

		match &self.api_version {
			Some(version) => builder.header("Version", version),
			None => builder,
		}
	}

	async fn send<T>(&self, endpoint: &'static str, request: RequestBuilder) -> CrmResult<T>
	where
		T: DeserializeOwned,
	{
		let response =
			request.send().await.map_err(|source| DownstreamError::Network { endpoint, source })?;
		let status = response.status();
		let body =
			response.bytes().await.map_err(|source| DownstreamError::Network { endpoint, source })?;

		if !status.is_success() {
			let body = String::from_utf8_lossy(&body).into_owned();

			tracing::warn!(endpoint, status = status.as_u16(), %body, "CRM call failed.");

			return Err(DownstreamError::Status { endpoint, status: status.as_u16(), body });
		}

		let mut de = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DownstreamError::Decode { endpoint, source })
	}
}
impl Debug for CrmClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CrmClient")
			.field("base", &self.base.as_str())
			.field("api_version", &self.api_version)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn endpoints_are_joined_under_the_base_path() {
		let client = CrmClient::new(
			ReqwestHttpClient::default(),
			Url::parse("https://api.example.com/v2/").expect("Base URL should parse."),
		);
		let url = client.endpoint(&["contacts", "abc/def"]).expect("Endpoint should build.");

		assert_eq!(url.as_str(), "https://api.example.com/v2/contacts/abc%2Fdef");
	}

	#[test]
	fn cannot_be_a_base_urls_are_rejected() {
		let client = CrmClient::new(
			ReqwestHttpClient::default(),
			Url::parse("mailto:ops@example.com").expect("Mailto URL should parse."),
		);

		assert!(matches!(
			client.endpoint(&["contacts"]),
			Err(DownstreamError::InvalidBase { .. })
		));
	}
}
