//! Wire models for the GoHighLevel REST endpoints the bridge calls.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, auth::ContactId};

/// Sub-account (location) profile returned by `GET /locations/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
	/// Location identifier.
	pub id: String,
	/// Business name.
	#[serde(default)]
	pub name: String,
	/// Contact email.
	#[serde(default)]
	pub email: Option<String>,
	/// Contact phone.
	#[serde(default)]
	pub phone: Option<String>,
	/// Street address.
	#[serde(default)]
	pub address: Option<String>,
	/// City.
	#[serde(default)]
	pub city: Option<String>,
	/// State or region.
	#[serde(default)]
	pub state: Option<String>,
	/// Country code.
	#[serde(default)]
	pub country: Option<String>,
	/// IANA timezone name.
	#[serde(default)]
	pub timezone: Option<String>,
	/// Public website.
	#[serde(default)]
	pub website: Option<String>,
}

/// CRM contact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
	/// Contact identifier.
	pub id: ContactId,
	/// Owning location.
	#[serde(default)]
	pub location_id: Option<String>,
	/// Primary email.
	#[serde(default)]
	pub email: Option<String>,
	/// Given name.
	#[serde(default)]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default)]
	pub last_name: Option<String>,
	/// Custom field values attached to the contact.
	#[serde(default)]
	pub custom_fields: Vec<CustomFieldValue>,
}
impl Contact {
	/// Looks up a custom field by id.
	pub fn custom_field(&self, id: &str) -> Option<&CustomFieldValue> {
		self.custom_fields.iter().find(|field| field.id == id)
	}

	/// Reads a custom field as a counter; missing or unparsable values read as zero.
	pub fn count(&self, field_id: &str) -> u64 {
		self.custom_field(field_id).and_then(CustomFieldValue::as_count).unwrap_or(0)
	}

	/// Human-readable name, falling back to the email and then the id.
	pub fn display_name(&self) -> String {
		let name = [self.first_name.as_deref(), self.last_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");

		if !name.is_empty() {
			name
		} else if let Some(email) = &self.email {
			email.clone()
		} else {
			self.id.to_string()
		}
	}
}

/// Custom field value as reported on a contact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
	/// Custom field definition id.
	pub id: String,
	/// Raw value; numbers may arrive as JSON numbers or strings.
	#[serde(default, alias = "field_value")]
	pub value: Value,
}
impl CustomFieldValue {
	/// Lenient non-negative integer view of the value.
	pub fn as_count(&self) -> Option<u64> {
		match &self.value {
			Value::Number(number) => number.as_u64().or_else(|| number.as_f64().and_then(truncate)),
			Value::String(raw) => {
				let raw = raw.trim();

				raw.parse::<u64>().ok().or_else(|| raw.parse::<f64>().ok().and_then(truncate))
			},
			_ => None,
		}
	}
}

fn truncate(value: f64) -> Option<u64> {
	(value.is_finite() && value >= 0.).then_some(value as u64)
}

/// Custom field write used by contact updates and upserts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldUpdate {
	/// Custom field definition id.
	pub id: String,
	/// New value.
	pub field_value: Value,
}
impl CustomFieldUpdate {
	/// Numeric write.
	pub fn count(id: impl Into<String>, value: u64) -> Self {
		Self { id: id.into(), field_value: Value::from(value) }
	}
}

/// Body of `POST /contacts/upsert`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpsert {
	/// Location the contact belongs to.
	pub location_id: String,
	/// Deduplication key.
	pub email: String,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Custom fields written alongside the contact.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub custom_fields: Vec<CustomFieldUpdate>,
}

/// Result of an upsert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpsertedContact {
	/// Contact as stored after the upsert.
	pub contact: Contact,
	/// True when the CRM created a new contact.
	#[serde(default, rename = "new")]
	pub created: bool,
}

#[derive(Deserialize)]
pub(crate) struct LocationEnvelope {
	pub(crate) location: Location,
}

#[derive(Deserialize)]
pub(crate) struct ContactLookup {
	#[serde(default)]
	pub(crate) contact: Option<Contact>,
}

#[derive(Deserialize)]
pub(crate) struct ContactEnvelope {
	pub(crate) contact: Contact,
}
