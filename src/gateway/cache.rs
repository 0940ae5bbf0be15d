//! Process-lifetime credential cache with rotation epochs.
//!
//! The cache is the gateway's only shared mutable state besides the refresh
//! gate. Every mutation happens inside the refresh critical section (or during
//! first-use priming), so a caller that observed epoch `E` when it attached a
//! credential can tell, after acquiring the gate, whether a refresh settled
//! while it was queued: the epoch moved.

// self
use crate::{_prelude::*, credential::AccessCredential, error::ExpiredSession};

#[derive(Debug, Default)]
struct CacheSlot {
	credential: Option<AccessCredential>,
	epoch: u64,
	failure: Option<ExpiredSession>,
	primed: bool,
}

/// Shared in-memory cache of the access credential and its rotation epoch.
#[derive(Clone, Debug, Default)]
pub(crate) struct CredentialCache(Arc<RwLock<CacheSlot>>);
impl CredentialCache {
	/// Returns the current credential view.
	pub(crate) fn snapshot(&self) -> CredentialSnapshot {
		let slot = self.0.read();

		CredentialSnapshot { credential: slot.credential.clone(), epoch: slot.epoch }
	}

	/// Returns `true` once the cache has been seeded from the store or a refresh.
	pub(crate) fn is_primed(&self) -> bool {
		self.0.read().primed
	}

	/// Seeds the cache from the store without advancing the epoch.
	///
	/// The first writer wins; concurrent primes are idempotent.
	pub(crate) fn prime(&self, credential: Option<AccessCredential>) {
		let mut slot = self.0.write();

		if slot.primed {
			return;
		}

		slot.credential = credential;
		slot.primed = true;
	}

	/// Publishes a freshly issued credential, advancing the epoch.
	pub(crate) fn publish(&self, credential: AccessCredential) {
		let mut slot = self.0.write();

		slot.credential = Some(credential);
		slot.failure = None;
		slot.primed = true;
		slot.epoch += 1;
	}

	/// Records a terminal refresh failure, advancing the epoch.
	pub(crate) fn invalidate(&self, failure: ExpiredSession) {
		let mut slot = self.0.write();

		slot.credential = None;
		slot.failure = Some(failure);
		slot.primed = true;
		slot.epoch += 1;
	}

	/// Returns the settled refresh outcome if the epoch moved past `observed_epoch`.
	///
	/// `None` means no refresh settled since the caller's snapshot and the caller
	/// is the designated refresher.
	pub(crate) fn settled_since(
		&self,
		observed_epoch: u64,
	) -> Option<Result<AccessCredential, ExpiredSession>> {
		let slot = self.0.read();

		if slot.epoch == observed_epoch {
			return None;
		}

		Some(match (&slot.credential, &slot.failure) {
			(Some(credential), _) => Ok(credential.clone()),
			(None, Some(failure)) => Err(failure.clone()),
			(None, None) => Err(ExpiredSession::new("Credential cache is empty")),
		})
	}
}

/// View of the credential cache at one instant.
///
/// The epoch identifies the rotation generation the credential belongs to;
/// recovery uses it to detect refreshes that settled while a caller was queued
/// behind the refresh gate.
#[derive(Clone, Debug)]
pub struct CredentialSnapshot {
	/// Cached access credential, if one is known.
	pub credential: Option<AccessCredential>,
	/// Rotation epoch the credential was observed at.
	pub epoch: u64,
}
