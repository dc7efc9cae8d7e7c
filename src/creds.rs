use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::store::CredentialStore;

/// OAuth scopes requested from the identity provider: spreadsheet read/write
/// plus read-only roster, course, and email access.
pub const SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/classroom.rosters.readonly",
    "https://www.googleapis.com/auth/classroom.courses.readonly",
    "https://www.googleapis.com/auth/classroom.profile.emails",
];

/// Refresh slightly before the reported expiry so a token is never handed
/// out with only seconds left on it.
const EXPIRY_SLACK_SECS: i64 = 60;

/// Parsed fields of an uploaded OAuth client-secret blob.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// The blob wraps its fields under either an `installed` or a `web` key.
pub fn parse_client_secret(blob: &str) -> Result<ClientSecret, ApiError> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| ApiError::Validation(format!("credentials file is not valid JSON: {}", e)))?;
    let section = value
        .get("installed")
        .or_else(|| value.get("web"))
        .ok_or_else(|| {
            ApiError::Validation(
                "credentials file must contain an 'installed' or 'web' section".to_string(),
            )
        })?;
    serde_json::from_value(section.clone())
        .map_err(|e| ApiError::Validation(format!("credentials file is incomplete: {}", e)))
}

/// A credential as persisted in the durable store, one per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub expiry: DateTime<Utc>,
}

impl StoredCredential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SLACK_SECS) >= self.expiry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    NoCredential,
    Authorizing,
    Authorized,
    Expired,
}

/// Where a session sits in the `NoCredential -> Authorizing -> Authorized
/// <-> Expired` lifecycle, derived from what the store holds.
pub fn credential_state(
    has_client_secret: bool,
    credential: Option<&StoredCredential>,
    now: DateTime<Utc>,
) -> CredentialState {
    match credential {
        Some(cred) if cred.is_expired(now) => CredentialState::Expired,
        Some(_) => CredentialState::Authorized,
        None if has_client_secret => CredentialState::Authorizing,
        None => CredentialState::NoCredential,
    }
}

/// Consent-screen URL for the redirect-based authorization-code flow.
/// `access_type=offline` + `prompt=consent` so a refresh token is issued.
pub fn consent_url(secret: &ClientSecret, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
        secret.auth_uri,
        urlencoding::encode(&secret.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&SCOPES.join(" ")),
        urlencoding::encode(state),
    )
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

async fn token_request(
    http: &reqwest::Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, ApiError> {
    let resp = http.post(token_uri).form(form).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::RemoteApi(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }
    Ok(resp.json().await?)
}

fn expiry_from(expires_in: Option<i64>, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::seconds(expires_in.unwrap_or(3600))
}

/// Completes the authorization-code exchange and produces the credential to
/// persist for the session.
pub async fn exchange_code(
    http: &reqwest::Client,
    secret: &ClientSecret,
    redirect_uri: &str,
    code: &str,
) -> Result<StoredCredential, ApiError> {
    let token = token_request(
        http,
        &secret.token_uri,
        &[
            ("code", code),
            ("client_id", &secret.client_id),
            ("client_secret", &secret.client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;
    Ok(StoredCredential {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_uri: secret.token_uri.clone(),
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: expiry_from(token.expires_in, Utc::now()),
    })
}

/// Silent refresh of an expired credential. The provider never re-runs the
/// interactive flow here; a missing refresh token is an authentication
/// failure for the caller to surface.
pub async fn refresh(
    http: &reqwest::Client,
    cred: &StoredCredential,
) -> Result<StoredCredential, ApiError> {
    let Some(refresh_token) = cred.refresh_token.as_deref() else {
        return Err(ApiError::AuthenticationRequired);
    };
    let token = token_request(
        http,
        &cred.token_uri,
        &[
            ("refresh_token", refresh_token),
            ("client_id", &cred.client_id),
            ("client_secret", &cred.client_secret),
            ("grant_type", "refresh_token"),
        ],
    )
    .await?;
    Ok(StoredCredential {
        access_token: token.access_token,
        // The provider usually omits the refresh token on refresh; keep ours.
        refresh_token: token.refresh_token.or_else(|| cred.refresh_token.clone()),
        token_uri: cred.token_uri.clone(),
        client_id: cred.client_id.clone(),
        client_secret: cred.client_secret.clone(),
        scopes: cred.scopes.clone(),
        expiry: expiry_from(token.expires_in, Utc::now()),
    })
}

pub fn lock_store(store: &Mutex<CredentialStore>) -> Result<MutexGuard<'_, CredentialStore>, ApiError> {
    store
        .lock()
        .map_err(|_| ApiError::Storage("credential store lock poisoned".to_string()))
}

/// Bearer token for a data operation. `Authorized` hands back the held
/// token; `Expired` refreshes and re-persists; a failed refresh drops the
/// credential so the session is back to `NoCredential`; no credential at
/// all fails with `AuthenticationRequired`.
pub async fn access_token(
    http: &reqwest::Client,
    store: &Mutex<CredentialStore>,
    session_id: &str,
) -> Result<String, ApiError> {
    let credential = lock_store(store)?.load_credential(session_id)?;
    let Some(credential) = credential else {
        return Err(ApiError::AuthenticationRequired);
    };
    if !credential.is_expired(Utc::now()) {
        return Ok(credential.access_token);
    }
    match refresh(http, &credential).await {
        Ok(refreshed) => {
            lock_store(store)?.save_credential(session_id, &refreshed)?;
            Ok(refreshed.access_token)
        }
        Err(e) => {
            log::warn!("token refresh failed for session {}: {}", session_id, e);
            lock_store(store)?.delete_credential(session_id)?;
            Err(ApiError::AuthenticationRequired)
        }
    }
}
