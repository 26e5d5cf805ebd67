//! Shared helpers for flow implementations (grant checks, singleflight guards).

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{GrantType, ProviderDescriptor},
};

/// Per-key singleflight guards.
///
/// Work submitted through [`FlowGuards::serialize`] for one key runs one after another while
/// distinct keys proceed in parallel.
pub struct FlowGuards<K> {
	guards: Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>,
}
impl<K> FlowGuards<K>
where
	K: Clone + Eq + Hash,
{
	/// Returns (and creates on demand) the guard for `key`.
	pub fn guard(&self, key: &K) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Runs `fut` while holding the guard for `key`.
	///
	/// The entry for `key` is removed once the last holder finishes, including when `fut` is
	/// dropped before completion, so the map only tracks keys with work in flight.
	pub async fn serialize<F>(&self, key: K, fut: F) -> F::Output
	where
		F: Future,
	{
		let lease = GuardLease { lock: self.guard(&key), guards: self, key };
		let _held = lease.lock.lock().await;

		fut.await
	}

	/// Number of keys currently tracked.
	pub fn len(&self) -> usize {
		self.guards.lock().len()
	}

	/// Returns true if no key is tracked.
	pub fn is_empty(&self) -> bool {
		self.guards.lock().is_empty()
	}
}
impl<K> Clone for FlowGuards<K> {
	fn clone(&self) -> Self {
		Self { guards: Arc::clone(&self.guards) }
	}
}
impl<K> Default for FlowGuards<K> {
	fn default() -> Self {
		Self { guards: Default::default() }
	}
}
impl<K> Debug for FlowGuards<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FlowGuards").field("keys", &self.guards.lock().len()).finish()
	}
}

struct GuardLease<'a, K>
where
	K: Clone + Eq + Hash,
{
	guards: &'a FlowGuards<K>,
	key: K,
	lock: Arc<AsyncMutex<()>>,
}
impl<K> Drop for GuardLease<'_, K>
where
	K: Clone + Eq + Hash,
{
	fn drop(&mut self) {
		let mut guards = self.guards.guards.lock();

		// Only the map and this lease still reference the mutex.
		if Arc::strong_count(&self.lock) == 2 {
			guards.remove(&self.key);
		}
	}
}

/// Fails with [`ConfigError::UnsupportedGrant`] when `descriptor` does not enable `grant`.
pub(crate) fn ensure_grant(descriptor: &ProviderDescriptor, grant: GrantType) -> Result<()> {
	if descriptor.supports(grant) {
		Ok(())
	} else {
		Err(ConfigError::UnsupportedGrant {
			descriptor: descriptor.id.to_string(),
			grant: grant.as_str(),
		}
		.into())
	}
}
