//! Transport primitives for gateway request dispatch.
//!
//! The module exposes [`GatewayHttpClient`] so downstream crates can integrate
//! custom HTTP clients. The gateway owns credential attachment, unauthorized
//! detection, and replay coordination; a transport only has to execute one
//! buffered request/response exchange at a time.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Buffered HTTP request handed to a transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Buffered HTTP response returned by a transport.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`GatewayHttpClient::execute`].
pub type TransportFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing gateway requests.
///
/// The trait acts as the gateway's only dependency on an HTTP stack. Callers
/// provide an implementation (typically behind `Arc<T>` where
/// `T: GatewayHttpClient`) and the gateway dispatches both application requests
/// and refresh calls through it. Implementations must be `Send + Sync + 'static`
/// so they can be shared across gateway clones without additional wrappers, and
/// the futures they return must be `Send` for the lifetime of the in-flight
/// operation.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes the request and resolves with the fully buffered response.
	///
	/// Implementations must return every HTTP response as `Ok`, including error
	/// statuses; `Err` is reserved for transport-level failures (DNS, TCP, TLS,
	/// timeouts) where no response was produced.
	fn execute(
		&self,
		request: HttpRequest,
	) -> TransportFuture<'_, HttpResponse, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The gateway replays requests itself, so configure any custom [`ReqwestClient`]
/// without automatic retry middleware to avoid duplicate dispatches.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(
		&self,
		request: HttpRequest,
	) -> TransportFuture<'_, HttpResponse, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
