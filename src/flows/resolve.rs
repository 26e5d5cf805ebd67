//! Expiry-aware token lookup used before every authenticated CRM call.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenRecord},
	flows::TokenManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl TokenManager {
	/// Returns a valid token record for `account`, refreshing it first when it has expired.
	///
	/// Unknown accounts fail with [`Error::NotFound`] without contacting the provider. When a
	/// refresh fails the stale record stays in the store and [`Error::RefreshFailed`] is returned.
	pub async fn resolve(&self, account: &AccountId) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Resolve;

		let span = FlowSpan::new(KIND, "resolve");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let current = self
					.store
					.fetch(account)
					.await?
					.ok_or_else(|| Error::token_not_found(account))?;

				if !current.is_expired() {
					return Ok(current);
				}

				tracing::debug!(
					%account,
					expired_at = %current.expires_at,
					"Stored token expired; refreshing."
				);

				self.refresh_with(account, false).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Returns the stored record for `account` without checking or refreshing it.
	pub async fn peek(&self, account: &AccountId) -> Result<Option<TokenRecord>> {
		Ok(self.store.fetch(account).await?)
	}
}
