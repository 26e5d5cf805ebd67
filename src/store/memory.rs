//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenRecord},
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<AccountId, TokenRecord>>>;

/// Process-local storage backend; records live until the process exits.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, record: TokenRecord) {
		map.write().insert(record.account.clone(), record);
	}

	fn fetch_now(map: StoreMap, account: &AccountId) -> Option<TokenRecord> {
		map.read().get(account).cloned()
	}

	fn accounts_now(map: StoreMap) -> Vec<AccountId> {
		let mut accounts = map.read().keys().cloned().collect::<Vec<_>>();

		accounts.sort();

		accounts
	}
}
impl TokenStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::save_now(map, record);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::fetch_now(map, account)) })
	}

	fn accounts(&self) -> StoreFuture<'_, Vec<AccountId>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::accounts_now(map)) })
	}
}
