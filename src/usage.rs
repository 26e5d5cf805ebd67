//! Per-contact usage counter stored in a CRM custom field, with a submission cap.
//!
//! The counter lives on the contact itself, so the read-increment-write below is only atomic
//! within this process: submissions for one contact are serialized by a guard keyed on the
//! account and the contact id, and the contact is re-read once the guard is held.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ContactId, TokenSecret},
	crm::{Contact, ContactUpsert, CrmClient, CustomFieldUpdate, UpsertedContact},
	error::ConfigError,
	flows::{FlowGuards, TokenManager},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Which custom fields hold the counter and the cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsagePolicy {
	/// Custom field id holding the submission counter.
	pub usage_field: Option<String>,
	/// Custom field id holding a per-contact cap.
	pub limit_field: Option<String>,
	/// Cap applied when the contact carries none.
	pub default_limit: u64,
}
impl UsagePolicy {
	/// Cap applied to `contact`: its limit field when configured and readable, else the default.
	pub fn limit_for(&self, contact: &Contact) -> u64 {
		self.limit_field
			.as_deref()
			.and_then(|field| contact.custom_field(field))
			.and_then(|value| value.as_count())
			.unwrap_or(self.default_limit)
	}

	fn usage_field(&self) -> Result<&str> {
		self.usage_field.as_deref().ok_or_else(|| ConfigError::UsageFieldNotConfigured.into())
	}
}
impl Default for UsagePolicy {
	fn default() -> Self {
		Self { usage_field: None, limit_field: None, default_limit: 10 }
	}
}

/// Outcome of a counted submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
	/// Contact whose counter was incremented.
	pub contact_id: ContactId,
	/// Caller-supplied id of the counted generation, echoed back.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ad_generation_id: Option<String>,
	/// Counter before the increment.
	pub previous_count: u64,
	/// Counter after the increment.
	pub new_count: u64,
	/// Cap applied to the contact.
	pub limit: u64,
	/// `limit - new_count`.
	pub remaining: u64,
}

/// Read-only view of a contact's usage.
#[derive(Clone, Debug, PartialEq)]
pub struct UsageSnapshot {
	/// Contact as returned by the CRM.
	pub contact: Contact,
	/// Current counter value.
	pub used: u64,
	/// Cap applied to the contact.
	pub limit: u64,
	/// Submissions left before the cap.
	pub remaining: u64,
}

/// Contact details accepted by [`UsageTracker::register_contact`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactRegistration {
	/// Deduplication key.
	pub email: String,
	/// Given name.
	pub first_name: Option<String>,
	/// Family name.
	pub last_name: Option<String>,
}

/// Counts submissions against a per-contact cap.
#[derive(Clone, Debug)]
pub struct UsageTracker {
	manager: TokenManager,
	crm: CrmClient,
	policy: UsagePolicy,
	contact_guards: FlowGuards<(AccountId, ContactId)>,
}
impl UsageTracker {
	/// Creates a tracker that resolves tokens through `manager` and talks to `crm`.
	pub fn new(manager: TokenManager, crm: CrmClient, policy: UsagePolicy) -> Self {
		Self { manager, crm, policy, contact_guards: Default::default() }
	}

	/// Active policy.
	pub fn policy(&self) -> &UsagePolicy {
		&self.policy
	}

	/// Number of contacts with a submission in flight.
	pub fn in_flight(&self) -> usize {
		self.contact_guards.len()
	}

	/// Increments the counter of the contact registered under `email` in `account`.
	///
	/// Fails with [`Error::LimitReached`] without writing when the counter is already at the
	/// cap, and with [`Error::NotFound`] when no contact matches the email.
	pub async fn track_submission(
		&self,
		account: &AccountId,
		email: &str,
		ad_generation_id: Option<&str>,
	) -> Result<SubmissionReceipt> {
		const KIND: FlowKind = FlowKind::TrackSubmission;

		let email = required_email(email)?;
		let span = FlowSpan::new(KIND, "track_submission");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let usage_field = self.policy.usage_field()?;
				let token = self.manager.resolve(account).await?;
				let found = self
					.crm
					.find_contact_by_email(&token.access_token, account, email)
					.await?
					.ok_or_else(|| Error::contact_not_found(email))?;

				let (previous_count, new_count, limit) = self
					.contact_guards
					.serialize(
						(account.clone(), found.id.clone()),
						self.count_submission(&token.access_token, &found.id, usage_field),
					)
					.await?;

				Ok(SubmissionReceipt {
					contact_id: found.id,
					ad_generation_id: ad_generation_id.map(str::to_owned),
					previous_count,
					new_count,
					limit,
					remaining: limit - new_count,
				})
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Re-reads the contact under its guard and writes `used + 1`, returning
	/// `(used, used + 1, limit)`.
	async fn count_submission(
		&self,
		token: &TokenSecret,
		contact_id: &ContactId,
		usage_field: &str,
	) -> Result<(u64, u64, u64)> {
		let contact = self.crm.contact(token, contact_id).await?;
		let used = contact.count(usage_field);
		let limit = self.policy.limit_for(&contact);

		if used >= limit {
			tracing::info!(contact = %contact.id, used, limit, "Submission limit reached.");

			return Err(Error::LimitReached { used, limit });
		}

		let new_count = used + 1;

		self.crm
			.update_custom_fields(
				token,
				contact_id,
				&[CustomFieldUpdate::count(usage_field, new_count)],
			)
			.await?;

		tracing::info!(contact = %contact.id, new_count, limit, "Counted submission.");

		Ok((used, new_count, limit))
	}

	/// Reads the usage of the contact registered under `email` without modifying it.
	pub async fn snapshot(&self, account: &AccountId, email: &str) -> Result<UsageSnapshot> {
		let email = required_email(email)?;
		let usage_field = self.policy.usage_field()?;
		let token = self.manager.resolve(account).await?;
		let contact = self
			.crm
			.find_contact_by_email(&token.access_token, account, email)
			.await?
			.ok_or_else(|| Error::contact_not_found(email))?;
		let used = contact.count(usage_field);
		let limit = self.policy.limit_for(&contact);

		Ok(UsageSnapshot { used, limit, remaining: limit.saturating_sub(used), contact })
	}

	/// Creates or updates a contact; newly created contacts start with a zero counter.
	pub async fn register_contact(
		&self,
		account: &AccountId,
		registration: ContactRegistration,
	) -> Result<UpsertedContact> {
		let email = required_email(&registration.email)?.to_owned();
		let token = self.manager.resolve(account).await?;
		let upsert = ContactUpsert {
			location_id: account.to_string(),
			email,
			first_name: non_blank(registration.first_name),
			last_name: non_blank(registration.last_name),
			custom_fields: Vec::new(),
		};
		let mut upserted = self.crm.upsert_contact(&token.access_token, &upsert).await?;

		if let (true, Some(usage_field)) = (upserted.created, self.policy.usage_field.as_deref()) {
			upserted.contact = self
				.crm
				.update_custom_fields(
					&token.access_token,
					&upserted.contact.id,
					&[CustomFieldUpdate::count(usage_field, 0)],
				)
				.await?;
		}

		tracing::info!(
			contact = %upserted.contact.id,
			created = upserted.created,
			"Upserted contact."
		);

		Ok(upserted)
	}
}

fn required_email(email: &str) -> Result<&str> {
	let email = email.trim();

	if email.is_empty() { Err(Error::MissingParameter { name: "email" }) } else { Ok(email) }
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn contact(fields: serde_json::Value) -> Contact {
		serde_json::from_value(serde_json::json!({ "id": "c-1", "customFields": fields }))
			.expect("Contact fixture should decode.")
	}

	#[test]
	fn limit_prefers_the_contact_field() {
		let policy = UsagePolicy {
			usage_field: Some("usage".into()),
			limit_field: Some("limit".into()),
			default_limit: 10,
		};

		let custom = contact(serde_json::json!([{ "id": "limit", "value": "25" }]));
		let blank = contact(serde_json::json!([{ "id": "limit", "value": "" }]));

		assert_eq!(policy.limit_for(&custom), 25);
		assert_eq!(policy.limit_for(&blank), 10);
		assert_eq!(policy.limit_for(&contact(serde_json::json!([]))), 10);
	}

	#[test]
	fn blank_emails_are_missing() {
		assert!(matches!(required_email("  "), Err(Error::MissingParameter { name: "email" })));
		assert_eq!(
			required_email(" a@example.com ").expect("Padded email should be accepted."),
			"a@example.com"
		);
	}
}
