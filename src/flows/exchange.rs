//! Authorization-code exchange run by the OAuth callback.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenRecord},
	flows::{TokenManager, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl TokenManager {
	/// Redeems `code` for a token pair and stores it under `account`, replacing any prior record.
	///
	/// A blank code fails with [`Error::MissingParameter`] before the provider is contacted.
	/// Provider rejections, transport failures, and timeouts surface as
	/// [`Error::ExchangeFailed`]; nothing is stored in that case.
	pub async fn exchange(&self, code: &str, account: &AccountId) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let code = code.trim();

		if code.is_empty() {
			return Err(Error::MissingParameter { name: "code" });
		}

		let span = FlowSpan::new(KIND, "exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				common::ensure_grant(&self.descriptor, GrantType::AuthorizationCode)?;

				self.flow_guards
					.serialize(account.clone(), self.exchange_and_store(code, account))
					.await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn exchange_and_store(&self, code: &str, account: &AccountId) -> Result<TokenRecord> {
		let record = self
			.facade()?
			.exchange_authorization_code(account, code, &self.scope)
			.await
			.map_err(|failure| {
				tracing::warn!(
					%account,
					status = ?failure.status,
					payload = %failure.payload,
					"Token exchange failed."
				);

				Error::ExchangeFailed(failure)
			})?;

		self.store.save(record.clone()).await?;

		tracing::info!(%account, expires_at = %record.expires_at, "Stored exchanged token record.");

		Ok(record)
	}
}
