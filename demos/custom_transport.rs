//! Demonstrates wiring a custom transport into the gateway.
//!
//! 1. Implement [`GatewayHttpClient`] for a transport that answers both application requests and
//!    refresh calls.
//! 2. Pass it to [`Gateway::with_http_client`] together with a store and descriptor.
//! 3. Watch a stale credential recover transparently: the first dispatch is rejected, the gateway
//!    refreshes once, and the original request is replayed with the rotated credential.
//! 4. Attach a [`SessionListener`] to observe the terminal failure path when the refresh endpoint
//!    stops cooperating.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use auth_gateway::{
	backend::{BackendDescriptor, BackendId},
	credential::{AccessCredential, CredentialPair, RefreshCredential},
	error::ExpiredSession,
	ext::SessionListener,
	gateway::Gateway,
	request::RequestDescriptor,
	store::{CredentialStore, MemoryStore},
	transport::{GatewayHttpClient, HttpRequest, HttpResponse, TransportFuture},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let descriptor = BackendDescriptor::builder(BackendId::new("scripted-backend")?)
		.base_url(Url::parse("https://backend.example.com/api/")?)
		.refresh_path("auth/refresh")
		.build()?;
	let store_backend = Arc::new(MemoryStore::with_pair(CredentialPair {
		access: Some(AccessCredential::new("stale-access")),
		refresh: Some(RefreshCredential::new("refresh-1")),
	}));
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let gateway: Gateway<ScriptedHttpClient> =
		Gateway::with_http_client(store, descriptor.clone(), ScriptedHttpClient::default());
	let response = gateway.send(RequestDescriptor::get("/courses")).await?;

	println!("Course catalog served after an automatic refresh: {}.", response.text());
	println!(
		"Access credential fingerprint after rotation: {}.",
		store_backend
			.pair()
			.access
			.map(|credential| credential.fingerprint())
			.unwrap_or_default(),
	);

	let dead_store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_pair(CredentialPair {
		access: Some(AccessCredential::new("stale-access")),
		refresh: Some(RefreshCredential::new("refresh-revoked")),
	}));
	let failing_gateway: Gateway<ScriptedHttpClient> =
		Gateway::with_http_client(dead_store, descriptor, ScriptedHttpClient::rejecting_refresh())
			.with_listener(Arc::new(PrintlnListener));

	match failing_gateway.send(RequestDescriptor::get("/courses")).await {
		Ok(_) => println!("The scripted transport unexpectedly accepted the dead session."),
		Err(e) => println!("Terminal failure surfaced to the caller: {e}"),
	}

	Ok(())
}

#[derive(Clone, Debug)]
#[allow(unused)]
enum ScriptedTransportError {
	ConnectionReset,
}
impl Display for ScriptedTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ConnectionReset => write!(f, "Connection reset by the scripted backend"),
		}
	}
}
impl StdError for ScriptedTransportError {}

/// Transport that scripts the backend: stale credentials are rejected, the refresh endpoint mints
/// `fresh-access`, and requests carrying the fresh credential succeed.
#[derive(Clone, Default)]
struct ScriptedHttpClient {
	reject_refresh: bool,
}
impl ScriptedHttpClient {
	fn rejecting_refresh() -> Self {
		Self { reject_refresh: true }
	}
}
impl GatewayHttpClient for ScriptedHttpClient {
	type TransportError = ScriptedTransportError;

	fn execute(
		&self,
		request: HttpRequest,
	) -> TransportFuture<'_, HttpResponse, Self::TransportError> {
		let reject_refresh = self.reject_refresh;

		Box::pin(async move {
			if request.uri().path().ends_with("/auth/refresh") {
				return if reject_refresh {
					Ok(scripted_response(400, b"{\"error\":\"invalid_grant\"}".to_vec()))
				} else {
					Ok(scripted_response(
						200,
						b"{\"access_token\":\"fresh-access\",\"expires_in\":900}".to_vec(),
					))
				};
			}

			let authorized = request
				.headers()
				.get("authorization")
				.and_then(|value| value.to_str().ok())
				== Some("Bearer fresh-access");

			if authorized {
				Ok(scripted_response(200, b"[\"rust-101\",\"tokio-201\"]".to_vec()))
			} else {
				Ok(scripted_response(401, Vec::new()))
			}
		})
	}
}

struct PrintlnListener;
impl SessionListener for PrintlnListener {
	fn session_expired(&self, reason: &ExpiredSession) {
		println!("Session listener fired, route to login: {reason}");
	}
}

fn scripted_response(status: u16, body: Vec<u8>) -> HttpResponse {
	let mut response = HttpResponse::new(body);

	*response.status_mut() =
		http::StatusCode::from_u16(status).expect("Scripted status codes are valid.");

	response
}
