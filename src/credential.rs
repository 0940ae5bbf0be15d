//! Credential domain types: redacted secrets, expiry helpers, and the persisted pair.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping credential material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSecret(String);
impl CredentialSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable fingerprint derived from the secret.
	///
	/// The fingerprint is a base64 (no padding) encoding of the SHA-256 digest of
	/// the secret bytes. It is safe to log and lets operators correlate credential
	/// rotations without exposing the secret itself.
	pub fn fingerprint(&self) -> String {
		STANDARD_NO_PAD.encode(Sha256::digest(self.0.as_bytes()))
	}
}
impl AsRef<str> for CredentialSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for CredentialSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CredentialSecret").field(&"<redacted>").finish()
	}
}
impl Display for CredentialSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Short-lived access credential attached to outbound requests.
///
/// The optional expiry instant is recorded when the refresh endpoint reports a
/// relative lifetime; a credential without an expiry hint is never considered
/// locally expired and relies on the backend's unauthorized response instead.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCredential {
	secret: CredentialSecret,
	expires_at: Option<OffsetDateTime>,
}
impl AccessCredential {
	/// Wraps a new access credential without an expiry hint.
	pub fn new(value: impl Into<String>) -> Self {
		Self { secret: CredentialSecret::new(value), expires_at: None }
	}

	/// Attaches an absolute expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.secret.expose()
	}

	/// Stable, log-safe fingerprint of the secret.
	pub fn fingerprint(&self) -> String {
		self.secret.fingerprint()
	}

	/// Expiry instant recorded for this credential, if any.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Returns `true` if the credential is expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| instant >= expiry)
	}

	/// Returns `true` if the credential is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for AccessCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessCredential")
			.field("secret", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Long-lived refresh credential exchanged for fresh access credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshCredential(CredentialSecret);
impl RefreshCredential {
	/// Wraps a new refresh credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(CredentialSecret::new(value))
	}

	/// Returns the inner secret value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.0.expose()
	}

	/// Stable, log-safe fingerprint of the secret.
	pub fn fingerprint(&self) -> String {
		self.0.fingerprint()
	}
}
impl Debug for RefreshCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RefreshCredential").field(&"<redacted>").finish()
	}
}

/// Snapshot of both credentials as persisted by [`CredentialStore`](crate::store::CredentialStore)
/// implementations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Cached access credential, if one has been issued.
	pub access: Option<AccessCredential>,
	/// Stored refresh credential, if the session is still refreshable.
	pub refresh: Option<RefreshCredential>,
}
