//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	credential::{AccessCredential, CredentialPair, RefreshCredential},
	store::{CredentialStore, StoreFuture},
};

type StoreSlot = Arc<RwLock<CredentialPair>>;

/// Thread-safe storage backend that keeps the credential pair in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreSlot);
impl MemoryStore {
	/// Creates a store seeded with the provided credential pair.
	pub fn with_pair(pair: CredentialPair) -> Self {
		Self(Arc::new(RwLock::new(pair)))
	}

	/// Returns a copy of the currently stored pair.
	pub fn pair(&self) -> CredentialPair {
		self.0.read().clone()
	}

	fn access_now(slot: StoreSlot) -> Option<AccessCredential> {
		slot.read().access.clone()
	}

	fn store_access_now(slot: StoreSlot, credential: AccessCredential) {
		slot.write().access = Some(credential);
	}

	fn refresh_now(slot: StoreSlot) -> Option<RefreshCredential> {
		slot.read().refresh.clone()
	}

	fn store_refresh_now(slot: StoreSlot, credential: RefreshCredential) {
		slot.write().refresh = Some(credential);
	}

	fn delete_refresh_now(slot: StoreSlot) {
		slot.write().refresh = None;
	}
}
impl CredentialStore for MemoryStore {
	fn access_credential(&self) -> StoreFuture<'_, Option<AccessCredential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::access_now(slot)) })
	}

	fn store_access(&self, credential: AccessCredential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::store_access_now(slot, credential);

			Ok(())
		})
	}

	fn refresh_credential(&self) -> StoreFuture<'_, Option<RefreshCredential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::refresh_now(slot)) })
	}

	fn store_refresh(&self, credential: RefreshCredential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::store_refresh_now(slot, credential);

			Ok(())
		})
	}

	fn delete_refresh(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::delete_refresh_now(slot);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn pair_round_trips_through_the_contract() {
		let store = MemoryStore::default();

		assert!(store.access_credential().await.expect("Access fetch should succeed.").is_none());

		store
			.store_access(AccessCredential::new("access-1"))
			.await
			.expect("Access store should succeed.");
		store
			.store_refresh(RefreshCredential::new("refresh-1"))
			.await
			.expect("Refresh store should succeed.");

		let access = store
			.access_credential()
			.await
			.expect("Access fetch should succeed.")
			.expect("Access credential should be present after storing.");

		assert_eq!(access.expose(), "access-1");

		store.delete_refresh().await.expect("Refresh delete should succeed.");

		assert!(
			store.refresh_credential().await.expect("Refresh fetch should succeed.").is_none(),
			"Refresh credential must be gone after deletion.",
		);
		assert!(
			store.access_credential().await.expect("Access fetch should succeed.").is_some(),
			"Deleting the refresh credential must not touch the access credential.",
		);
	}

	#[tokio::test]
	async fn clones_share_the_same_slot() {
		let store = MemoryStore::default();
		let clone = store.clone();

		clone
			.store_access(AccessCredential::new("shared"))
			.await
			.expect("Access store should succeed.");

		assert!(store.pair().access.is_some(), "Clones must observe each other's writes.");
	}
}
