use chrono::{Duration, Utc};
use classledgerd::creds::{credential_state, CredentialState, StoredCredential, SCOPES};
use classledgerd::store;

fn credential(access_token: &str, expires_in_secs: i64) -> StoredCredential {
    StoredCredential {
        access_token: access_token.to_string(),
        refresh_token: Some("rt".to_string()),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
        client_id: "cid".to_string(),
        client_secret: "cs".to_string(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: Utc::now() + Duration::seconds(expires_in_secs),
    }
}

#[test]
fn client_secret_roundtrip() {
    let store = store::open_in_memory().unwrap();
    assert!(store.load_client_secret("sess-a").unwrap().is_none());

    store.save_client_secret("sess-a", "{\"installed\":{}}").unwrap();
    assert_eq!(
        store.load_client_secret("sess-a").unwrap().as_deref(),
        Some("{\"installed\":{}}")
    );

    // Re-upload replaces the blob.
    store.save_client_secret("sess-a", "{\"web\":{}}").unwrap();
    assert_eq!(
        store.load_client_secret("sess-a").unwrap().as_deref(),
        Some("{\"web\":{}}")
    );
}

#[test]
fn credential_roundtrip_and_delete() {
    let store = store::open_in_memory().unwrap();

    store.save_credential("sess-a", &credential("tok-1", 3600)).unwrap();
    let loaded = store.load_credential("sess-a").unwrap().unwrap();
    assert_eq!(loaded.access_token, "tok-1");
    assert_eq!(loaded.refresh_token.as_deref(), Some("rt"));

    store.save_credential("sess-a", &credential("tok-2", 3600)).unwrap();
    let replaced = store.load_credential("sess-a").unwrap().unwrap();
    assert_eq!(replaced.access_token, "tok-2");

    store.delete_credential("sess-a").unwrap();
    assert!(store.load_credential("sess-a").unwrap().is_none());
}

#[test]
fn sessions_are_isolated() {
    let store = store::open_in_memory().unwrap();

    store.save_client_secret("sess-a", "blob-a").unwrap();
    store.save_credential("sess-a", &credential("tok-a", 3600)).unwrap();

    assert!(store.load_client_secret("sess-b").unwrap().is_none());
    assert!(store.load_credential("sess-b").unwrap().is_none());
}

#[test]
fn auth_states_are_single_use() {
    let store = store::open_in_memory().unwrap();

    store.put_auth_state("state-1", "sess-a").unwrap();
    assert_eq!(
        store.take_auth_state("state-1").unwrap().as_deref(),
        Some("sess-a")
    );
    assert!(store.take_auth_state("state-1").unwrap().is_none());
    assert!(store.take_auth_state("never-issued").unwrap().is_none());
}

#[test]
fn stored_credentials_drive_the_lifecycle_states() {
    let now = Utc::now();

    assert_eq!(credential_state(false, None, now), CredentialState::NoCredential);
    assert_eq!(credential_state(true, None, now), CredentialState::Authorizing);

    let live = credential("tok", 3600);
    assert_eq!(credential_state(true, Some(&live), now), CredentialState::Authorized);

    let expired = credential("tok", -10);
    assert_eq!(credential_state(true, Some(&expired), now), CredentialState::Expired);
}
