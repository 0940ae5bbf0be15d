// std
use std::{env, path::PathBuf, process, sync::Arc};
// self
use auth_gateway::{
	credential::{AccessCredential, CredentialPair, RefreshCredential},
	store::{CredentialStore, FileStore, MemoryStore},
};

fn temp_path(label: &str) -> PathBuf {
	let unique = format!(
		"auth_gateway_{label}_{}_{}.json",
		process::id(),
		time::OffsetDateTime::now_utc().unix_timestamp_nanos(),
	);

	env::temp_dir().join(unique)
}

async fn exercise_contract(store: Arc<dyn CredentialStore>) {
	assert!(
		store.access_credential().await.expect("Access fetch should succeed.").is_none(),
		"A fresh store must start without an access credential.",
	);

	store
		.store_access(AccessCredential::new("access-1"))
		.await
		.expect("Access store should succeed.");
	store
		.store_refresh(RefreshCredential::new("refresh-1"))
		.await
		.expect("Refresh store should succeed.");

	let access = store
		.access_credential()
		.await
		.expect("Access fetch should succeed.")
		.expect("Access credential should be present after storing.");
	let refresh = store
		.refresh_credential()
		.await
		.expect("Refresh fetch should succeed.")
		.expect("Refresh credential should be present after storing.");

	assert_eq!(access.expose(), "access-1");
	assert_eq!(refresh.expose(), "refresh-1");

	// Rotation replaces in place.
	store
		.store_refresh(RefreshCredential::new("refresh-2"))
		.await
		.expect("Refresh rotation should succeed.");

	let rotated = store
		.refresh_credential()
		.await
		.expect("Refresh fetch should succeed.")
		.expect("Rotated refresh credential should be present.");

	assert_eq!(rotated.expose(), "refresh-2");

	store.delete_refresh().await.expect("Refresh delete should succeed.");

	assert!(
		store.refresh_credential().await.expect("Refresh fetch should succeed.").is_none(),
		"Refresh credential must be gone after deletion.",
	);
	assert!(
		store.access_credential().await.expect("Access fetch should succeed.").is_some(),
		"Deleting the refresh credential must leave the access credential in place.",
	);
}

#[tokio::test]
async fn memory_store_honors_the_contract() {
	exercise_contract(Arc::new(MemoryStore::default())).await;
}

#[tokio::test]
async fn file_store_honors_the_contract() {
	let path = temp_path("contract");

	exercise_contract(Arc::new(
		FileStore::open(&path).expect("Failed to open file store snapshot."),
	))
	.await;

	std::fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn file_store_survives_reopen() {
	let path = temp_path("reopen");

	{
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");

		store
			.store_access(
				AccessCredential::new("persisted-access")
					.with_expires_at(time::macros::datetime!(2030-01-01 00:00 UTC)),
			)
			.await
			.expect("Access store should succeed.");
		store
			.store_refresh(RefreshCredential::new("persisted-refresh"))
			.await
			.expect("Refresh store should succeed.");
	}

	let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
	let access = reopened
		.access_credential()
		.await
		.expect("Access fetch should succeed.")
		.expect("Access credential should survive reopen.");

	assert_eq!(access.expose(), "persisted-access");
	assert_eq!(access.expires_at(), Some(time::macros::datetime!(2030-01-01 00:00 UTC)));

	std::fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn memory_store_seeds_from_a_pair() {
	let store = MemoryStore::with_pair(CredentialPair {
		access: Some(AccessCredential::new("seeded-access")),
		refresh: Some(RefreshCredential::new("seeded-refresh")),
	});

	assert_eq!(
		store
			.access_credential()
			.await
			.expect("Access fetch should succeed.")
			.expect("Seeded access credential should be present.")
			.expose(),
		"seeded-access",
	);
}
