//! Request dispatch, unauthorized detection, and single-replay coordination.

// self
use crate::{
	_prelude::*,
	credential::AccessCredential,
	error::TransportError,
	gateway::{CredentialSnapshot, Gateway},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{GatewayResponse, RequestDescriptor},
	transport::GatewayHttpClient,
};

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Sends the request with the current access credential attached.
	///
	/// Non-auth HTTP statuses are returned to the caller untouched; the gateway
	/// only interprets `401 Unauthorized`. The first unauthorized response routes
	/// through [`recover`](Self::recover) (refreshing, or suspending behind an
	/// in-flight refresh) and the request is replayed exactly once with the
	/// replacement credential. A replay that is rejected again fails with
	/// [`Error::Unauthorized`] without another refresh attempt.
	pub async fn send(&self, request: RequestDescriptor) -> Result<GatewayResponse> {
		const KIND: FlowKind = FlowKind::Send;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_inner(&request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send_inner(&self, request: &RequestDescriptor) -> Result<GatewayResponse> {
		let mut snapshot = self.credential_snapshot().await?;

		// A credential that is locally expired per its expiry hint would only buy
		// a guaranteed-unauthorized round trip, so refresh up front.
		if snapshot.credential.as_ref().is_some_and(AccessCredential::is_expired) {
			snapshot = self.recover(snapshot.epoch).await?;
		}

		let response = self.dispatch(request, snapshot.credential.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return Ok(response);
		}

		let snapshot = self.recover(snapshot.epoch).await?;

		self.replay(request, &snapshot).await
	}

	/// Re-dispatches the original request with the refreshed credential.
	///
	/// The replay is already marked as retried: a second unauthorized response is
	/// terminal and must not recurse into another refresh.
	async fn replay(
		&self,
		request: &RequestDescriptor,
		snapshot: &CredentialSnapshot,
	) -> Result<GatewayResponse> {
		const KIND: FlowKind = FlowKind::Replay;

		let span = FlowSpan::new(KIND, "replay");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.dispatch(request, snapshot.credential.as_ref()).await?;

				if response.status() == StatusCode::UNAUTHORIZED {
					return Err(Error::Unauthorized);
				}

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn dispatch(
		&self,
		request: &RequestDescriptor,
		credential: Option<&AccessCredential>,
	) -> Result<GatewayResponse> {
		let wire = request.to_http_request(&self.descriptor, credential)?;
		let response =
			self.http_client.execute(wire).await.map_err(TransportError::network)?;

		Ok(GatewayResponse::from_http(response))
	}

	/// Returns the cached credential view, priming it from the store on first use.
	pub(crate) async fn credential_snapshot(&self) -> Result<CredentialSnapshot> {
		if !self.cache.is_primed() {
			let stored = self.store.access_credential().await?;

			self.cache.prime(stored);
		}

		Ok(self.cache.snapshot())
	}
}
