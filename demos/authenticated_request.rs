//! Issues an authenticated request against a live backend with a file-backed credential store.
//!
//! Environment variables:
//! - `GATEWAY_BASE_URL` (required): backend base URL, e.g. `https://api.example.com/v1`.
//! - `GATEWAY_REFRESH_PATH` (optional): refresh path, defaults to `auth/refresh`.
//! - `GATEWAY_RESOURCE` (optional): resource path to fetch, defaults to `profile`.
//! - `GATEWAY_ACCESS` / `GATEWAY_REFRESH` (optional): seed credentials; omit them to reuse the
//!   file store from a previous run.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use auth_gateway::{
	backend::{BackendDescriptor, BackendId},
	credential::{AccessCredential, RefreshCredential},
	error::ExpiredSession,
	ext::SessionListener,
	gateway::Gateway,
	request::RequestDescriptor,
	store::{CredentialStore, FileStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let base_url = env::var("GATEWAY_BASE_URL")?;
	let refresh_path =
		env::var("GATEWAY_REFRESH_PATH").unwrap_or_else(|_| "auth/refresh".into());
	let resource = env::var("GATEWAY_RESOURCE").unwrap_or_else(|_| "profile".into());
	let store_backend =
		Arc::new(FileStore::open(env::temp_dir().join("auth_gateway_demo_credentials.json"))?);

	if let Ok(access) = env::var("GATEWAY_ACCESS") {
		store_backend.store_access(AccessCredential::new(access)).await?;
	}
	if let Ok(refresh) = env::var("GATEWAY_REFRESH") {
		store_backend.store_refresh(RefreshCredential::new(refresh)).await?;
	}

	let store: Arc<dyn CredentialStore> = store_backend;
	let descriptor = BackendDescriptor::builder(BackendId::new("demo-backend")?)
		.base_url(Url::parse(&base_url)?)
		.refresh_path(refresh_path)
		.build()?;
	let gateway = Gateway::new(store, descriptor).with_listener(Arc::new(PrintlnListener));
	let response = gateway.send(RequestDescriptor::get(&resource)).await?;

	println!("HTTP {}.", response.status());
	println!("{}", response.text());

	Ok(())
}

struct PrintlnListener;
impl SessionListener for PrintlnListener {
	fn session_expired(&self, reason: &ExpiredSession) {
		eprintln!("Session expired, re-authentication is required: {reason}");
	}
}
