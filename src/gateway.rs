//! High-level request gateway coordinating credential attachment and refresh.

mod cache;
mod send;

pub mod refresh;

pub use cache::CredentialSnapshot;
pub use refresh::RefreshMetrics;

pub(crate) use cache::CredentialCache;

// self
use crate::{
	_prelude::*,
	backend::BackendDescriptor,
	ext::{NoopSessionListener, SessionListener},
	store::CredentialStore,
	transport::GatewayHttpClient,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Coordinates authenticated requests against a single backend descriptor.
///
/// The gateway owns the HTTP client, credential store, backend descriptor, and
/// session listener references so the send/replay/refresh implementations can
/// focus on coordination logic. The access credential is cached in memory for
/// the process lifetime; every durable credential mutation goes through the
/// store. Clones share the credential cache and refresh gate, so single-flight
/// coordination spans every handle derived from the same gateway.
pub struct Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// HTTP client wrapper used for every outbound backend request.
	pub http_client: Arc<C>,
	/// Credential store implementation that persists issued secrets.
	pub store: Arc<dyn CredentialStore>,
	/// Backend descriptor that defines endpoints and the auth scheme.
	pub descriptor: BackendDescriptor,
	/// Listener notified once per terminal refresh failure.
	pub listener: Arc<dyn SessionListener>,
	/// Shared metrics recorder for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	cache: CredentialCache,
	refresh_gate: Arc<AsyncMutex<()>>,
}
impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: BackendDescriptor,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			listener: Arc::new(NoopSessionListener),
			refresh_metrics: Default::default(),
			cache: Default::default(),
			refresh_gate: Default::default(),
		}
	}

	/// Sets or replaces the session listener invoked on terminal refresh failure.
	pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
		self.listener = listener;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a new gateway for the provided descriptor.
	///
	/// The gateway provisions its own reqwest-backed transport so callers do not
	/// need to pass HTTP handles explicitly. Use [`Gateway::with_listener`] to
	/// attach a session listener when the application needs to react to expiry.
	pub fn new(store: Arc<dyn CredentialStore>, descriptor: BackendDescriptor) -> Self {
		Self::with_http_client(store, descriptor, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			listener: self.listener.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			cache: self.cache.clone(),
			refresh_gate: self.refresh_gate.clone(),
		}
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("descriptor", &self.descriptor)
			.field(
				"credential_fingerprint",
				&self.cache.snapshot().credential.map(|credential| credential.fingerprint()),
			)
			.finish()
	}
}
