//! Credential refresh orchestration with a single-flight gate and FIFO waiters.
//!
//! The gateway exposes [`Gateway::refresh_access_credential`] so callers can
//! force a rotation, while unauthorized responses route through the crate-level
//! recovery path. Every recovery acquires the shared refresh gate; the first
//! caller through becomes the designated refresher and everyone queued behind it
//! adopts the settled outcome instead of issuing another refresh call. The gate
//! guard is released on every path (including panics), which clears the
//! "refresh in flight" state and drains the queue unconditionally.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	backend::BackendDescriptor,
	credential::{AccessCredential, RefreshCredential},
	error::{ConfigError, ExpiredSession},
	gateway::{CredentialSnapshot, Gateway},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::GatewayResponse,
	transport::{GatewayHttpClient, HttpRequest},
};

/// Wire body sent to the refresh endpoint.
#[derive(Serialize)]
struct RefreshCall<'a> {
	refresh_token: &'a str,
}

/// Wire body returned by the refresh endpoint.
///
/// Only `access_token` is mandatory; `refresh_token` rotates the stored refresh
/// credential and `expires_in` (seconds) attaches a local expiry hint.
#[derive(Deserialize)]
struct RefreshGrant {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Forces a credential refresh, coordinating with any in-flight recovery.
	///
	/// Callers queued behind an in-flight refresh adopt its outcome rather than
	/// triggering a second rotation.
	pub async fn refresh_access_credential(&self) -> Result<AccessCredential> {
		let snapshot = self.credential_snapshot().await?;
		let refreshed = self.recover(snapshot.epoch).await?;

		refreshed
			.credential
			.ok_or_else(|| ExpiredSession::new("Credential cache is empty after refresh").into())
	}

	/// Recovers from an expired credential observed at `observed_epoch`.
	///
	/// Acquiring the refresh gate is the suspension point: callers queue here in
	/// FIFO order while a refresh is in flight, and all of them settle once it
	/// does. After acquiring, the epoch check distinguishes the designated
	/// refresher (epoch unchanged) from waiters adopting a settled outcome.
	pub(crate) async fn recover(&self, observed_epoch: u64) -> Result<CredentialSnapshot> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "recover");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_gate.lock().await;

				if let Some(outcome) = self.cache.settled_since(observed_epoch) {
					return match outcome {
						Ok(_) => {
							self.refresh_metrics.record_success();

							Ok(self.cache.snapshot())
						},
						Err(expired) => {
							self.refresh_metrics.record_failure();

							Err(Error::SessionExpired(expired))
						},
					};
				}

				match self.refresh_credentials_locked().await {
					Ok(_) => {
						self.refresh_metrics.record_success();

						Ok(self.cache.snapshot())
					},
					Err(expired) => {
						self.refresh_metrics.record_failure();

						Err(Error::SessionExpired(expired))
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Runs the refresh procedure. Must only be called while holding the gate.
	///
	/// Any failure is terminal for the credential session: the stored refresh
	/// credential is deleted, the cache is invalidated with the shared failure,
	/// and the session listener fires exactly once.
	async fn refresh_credentials_locked(&self) -> Result<AccessCredential, ExpiredSession> {
		let refresh = match self.store.refresh_credential().await {
			Ok(Some(credential)) => credential,
			Ok(None) =>
				return self
					.expire_session("No refresh credential is available in the store")
					.await,
			Err(e) =>
				return self.expire_session(format!("Refresh credential fetch failed: {e}")).await,
		};
		let call = RefreshCall { refresh_token: refresh.expose() };
		let request = match build_refresh_request(&self.descriptor, &call) {
			Ok(request) => request,
			Err(e) =>
				return self
					.expire_session(format!("Refresh request construction failed: {e}"))
					.await,
		};
		let response = match self.http_client.execute(request).await {
			Ok(response) => GatewayResponse::from_http(response),
			Err(e) =>
				return self
					.expire_session(format!("Refresh endpoint transport failure: {e}"))
					.await,
		};

		if !response.is_success() {
			return self
				.expire_session(format!(
					"Refresh endpoint returned HTTP {}",
					response.status().as_u16(),
				))
				.await;
		}

		let grant = match response.json::<RefreshGrant>() {
			Ok(grant) => grant,
			Err(e) =>
				return self
					.expire_session(format!("Refresh endpoint returned a malformed grant: {e}"))
					.await,
		};
		let mut credential = AccessCredential::new(grant.access_token);

		if let Some(secs) = grant.expires_in {
			credential =
				credential.with_expires_at(OffsetDateTime::now_utc() + Duration::seconds(secs));
		}

		if let Err(e) = self.store.store_access(credential.clone()).await {
			return self
				.expire_session(format!("Persisting the refreshed access credential failed: {e}"))
				.await;
		}
		if let Some(rotated) = grant.refresh_token {
			if let Err(e) = self.store.store_refresh(RefreshCredential::new(rotated)).await {
				return self
					.expire_session(format!(
						"Persisting the rotated refresh credential failed: {e}",
					))
					.await;
			}
		}

		self.cache.publish(credential.clone());

		Ok(credential)
	}

	/// Terminal failure path shared by every refresh error.
	async fn expire_session(
		&self,
		reason: impl Into<String>,
	) -> Result<AccessCredential, ExpiredSession> {
		let failure = ExpiredSession::new(reason);

		// The session is already terminal; a delete failure cannot change the outcome.
		let _ = self.store.delete_refresh().await;

		self.cache.invalidate(failure.clone());
		self.listener.session_expired(&failure);

		Err(failure)
	}
}

fn build_refresh_request(
	descriptor: &BackendDescriptor,
	call: &RefreshCall<'_>,
) -> Result<HttpRequest, ConfigError> {
	let payload =
		serde_json::to_vec(call).map_err(|source| ConfigError::BodyEncode { source })?;
	let request = http::Request::builder()
		.method(Method::POST)
		.uri(descriptor.refresh_endpoint.as_str())
		.header(http::header::CONTENT_TYPE, "application/json")
		.header(http::header::ACCEPT, "application/json")
		.body(payload)?;

	Ok(request)
}
