//! Storage contracts and built-in store implementations for gateway credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	credential::{AccessCredential, RefreshCredential},
};

/// Persistence contract future for gateway credential stores.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence collaborator owning the credential pair.
///
/// The gateway never persists credentials itself; it only caches the access
/// credential in memory for the process lifetime and drives every durable
/// mutation through this trait. Implementations back onto whatever secure
/// storage the embedding application provides (keychain, encrypted file,
/// platform secret service).
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the persisted access credential, if present.
	fn access_credential(&self) -> StoreFuture<'_, Option<AccessCredential>>;

	/// Persists or replaces the access credential.
	fn store_access(&self, credential: AccessCredential) -> StoreFuture<'_, ()>;

	/// Fetches the persisted refresh credential, if present.
	fn refresh_credential(&self) -> StoreFuture<'_, Option<RefreshCredential>>;

	/// Persists or replaces the refresh credential (rotation).
	fn store_refresh(&self, credential: RefreshCredential) -> StoreFuture<'_, ()>;

	/// Deletes the refresh credential, ending the refreshable session.
	fn delete_refresh(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
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
