//! Storage contract and the built-in in-memory store for token records.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenRecord},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for token records keyed by account.
///
/// Implementations hold at most one record per account; [`save`](TokenStore::save) replaces any
/// existing record wholesale. Swapping the in-memory backend for a database only requires a new
/// implementation of this trait.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record for `record.account`.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record associated with the account, if present.
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Lists every account that currently has a record.
	fn accounts(&self) -> StoreFuture<'_, Vec<AccountId>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
