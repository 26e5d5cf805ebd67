//! Refresh token orchestration with singleflight guards and metrics.
//!
//! [`TokenManager::refresh`] mints a new access token for an account from the stored refresh
//! token. Each call acquires the account's guard, so concurrent resolves of one expired record
//! reach the token endpoint once: callers that waited on the guard re-read the store and reuse
//! the record the first caller saved.

mod metrics;

pub use self::metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenRecord},
	error::ProviderFailure,
	flows::{TokenManager, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl TokenManager {
	/// Refreshes the record for `account` unconditionally.
	///
	/// The stored record is overwritten on success. If the provider does not rotate the refresh
	/// token, the previous one is kept. On failure the stored record is left untouched.
	pub async fn refresh(&self, account: &AccountId) -> Result<TokenRecord> {
		self.refresh_with(account, true).await
	}

	pub(crate) async fn refresh_with(
		&self,
		account: &AccountId,
		force: bool,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				common::ensure_grant(&self.descriptor, GrantType::RefreshToken)?;
				self.refresh_metrics.record_attempt();

				self.flow_guards.serialize(account.clone(), self.refresh_stored(account, force)).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn refresh_stored(&self, account: &AccountId, force: bool) -> Result<TokenRecord> {
		let current = self
			.store
			.fetch(account)
			.await
			.inspect_err(|_| self.refresh_metrics.record_failure())?
			.ok_or_else(|| {
				self.refresh_metrics.record_failure();

				Error::token_not_found(account)
			})?;

		// Another caller may have refreshed while this one waited on the guard.
		if !force && !current.is_expired() {
			self.refresh_metrics.record_success();

			return Ok(current);
		}

		let refreshed = self.refresh_record(account, &current).await.inspect_err(|e| {
			self.refresh_metrics.record_failure();

			tracing::warn!(%account, error = %e, "Token refresh failed; keeping the stored record.");
		})?;

		self.store
			.save(refreshed.clone())
			.await
			.inspect_err(|_| self.refresh_metrics.record_failure())?;
		self.refresh_metrics.record_success();

		tracing::info!(%account, expires_at = %refreshed.expires_at, "Refreshed token record.");

		Ok(refreshed)
	}

	async fn refresh_record(
		&self,
		account: &AccountId,
		current: &TokenRecord,
	) -> Result<TokenRecord> {
		let refresh_token = current.refresh_token.as_ref().ok_or_else(|| {
			Error::RefreshFailed(ProviderFailure::local(
				"No refresh token is stored for this account.",
			))
		})?;
		let (mut refreshed, rotated) = self
			.facade()?
			.refresh_token(account, refresh_token.expose(), &current.scope)
			.await
			.map_err(Error::RefreshFailed)?;

		if rotated.is_none() {
			refreshed.refresh_token = current.refresh_token.clone();
		}

		Ok(refreshed)
	}
}
