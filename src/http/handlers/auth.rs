use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{ensure_session, require};
use crate::creds::{self, credential_state};
use crate::error::ApiError;
use crate::http::types::AppState;

/// GET /credentials — reports whether a client-secret blob is on file for
/// this session and where the session sits in the credential lifecycle.
pub async fn credentials_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, session_id) = ensure_session(jar);
    let store = creds::lock_store(&state.store)?;
    let secret = store.load_client_secret(&session_id)?;
    let credential = store.load_credential(&session_id)?;
    drop(store);

    let lifecycle = credential_state(secret.is_some(), credential.as_ref(), Utc::now());
    Ok((
        jar,
        Json(json!({
            "uploaded": secret.is_some(),
            "state": lifecycle,
        })),
    ))
}

/// POST /credentials — multipart upload of the OAuth client-secret blob.
/// The blob is validated before it is stored; storing it moves the session
/// out of `NoCredential`.
pub async fn upload_credentials(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, session_id) = ensure_session(jar);

    let mut blob: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("credentials") {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("unreadable credentials file: {}", e)))?;
            blob = Some(text);
        }
    }
    let blob = blob.ok_or_else(|| {
        ApiError::Validation("multipart file field 'credentials' is required".to_string())
    })?;
    creds::parse_client_secret(&blob)?;

    creds::lock_store(&state.store)?.save_client_secret(&session_id, &blob)?;
    log::info!("stored client secret for session {}", session_id);
    Ok((jar, Json(json!({ "message": "credentials uploaded" }))))
}

/// GET /authenticate_google — first leg of the authorization-code flow:
/// redirects the caller to the consent screen. The generated `state` token
/// is persisted against the session and must round-trip through the
/// callback.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, session_id) = ensure_session(jar);

    let blob = creds::lock_store(&state.store)?.load_client_secret(&session_id)?;
    let blob = blob.ok_or_else(|| {
        ApiError::Validation("no client secret uploaded for this session".to_string())
    })?;
    let secret = creds::parse_client_secret(&blob)?;

    let flow_state = Uuid::new_v4().to_string();
    creds::lock_store(&state.store)?.put_auth_state(&flow_state, &session_id)?;

    let url = creds::consent_url(&secret, &state.redirect_uri(), &flow_state);
    Ok((jar, Redirect::to(&url)))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// GET /oauth2callback — second leg: exchanges the authorization code for
/// tokens and persists the credential for the session that started the
/// flow. The `state` token is single-use.
pub async fn oauth2_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let code = require(query.code, "code")?;
    let flow_state = require(query.state, "state")?;

    let session_id = creds::lock_store(&state.store)?.take_auth_state(&flow_state)?;
    let session_id = session_id.ok_or_else(|| {
        ApiError::Validation("unknown or already used authorization state".to_string())
    })?;

    let blob = creds::lock_store(&state.store)?.load_client_secret(&session_id)?;
    let blob = blob.ok_or_else(|| {
        ApiError::Validation("no client secret uploaded for this session".to_string())
    })?;
    let secret = creds::parse_client_secret(&blob)?;

    let credential = creds::exchange_code(&state.http, &secret, &state.redirect_uri(), &code).await?;
    creds::lock_store(&state.store)?.save_credential(&session_id, &credential)?;

    log::info!("authorization complete for session {}", session_id);
    Ok((jar, Json(json!({ "message": "authorization complete" }))))
}
