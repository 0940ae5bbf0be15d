//! Gateway-level error types shared across transport, store, and refresh coordination.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend rejected the request again after the single credential replay.
	#[error("Request remained unauthorized after a credential replay.")]
	Unauthorized,
	/// Credential refresh failed terminally; re-authentication is required.
	#[error(transparent)]
	SessionExpired(#[from] ExpiredSession),
}

/// Configuration and request construction failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Backend descriptor validation failed.
	#[error("Backend descriptor is invalid.")]
	Descriptor(#[from] crate::backend::DescriptorError),
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Request path could not be resolved against the backend base URL.
	#[error("Request path `{path}` cannot be resolved against the backend base URL.")]
	InvalidRequestPath {
		/// Path supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// JSON body serialization failed.
	#[error("Request body could not be serialized as JSON.")]
	BodyEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Terminal refresh failure shared with every caller settled by the same refresh.
///
/// The value is clonable so the designated refresher and all queued waiters can
/// reject with the same failure. The reason string summarizes the underlying
/// cause without exposing credential material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Credential session expired: {reason}.")]
pub struct ExpiredSession {
	/// Human-readable summary of the refresh failure.
	pub reason: String,
}
impl ExpiredSession {
	/// Creates a new terminal failure with the provided reason.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}
