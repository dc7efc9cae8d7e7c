use std::sync::Mutex;

use crate::store::CredentialStore;

pub struct ServerConfig {
    /// Public base URL of this service, used to build the OAuth redirect URI.
    pub external_url: String,
}

/// Shared per-process state. The credential store is the only mutable piece
/// and is serialized behind a mutex; everything else is read-only.
pub struct AppState {
    pub cfg: ServerConfig,
    pub http: reqwest::Client,
    pub store: Mutex<CredentialStore>,
}

impl AppState {
    pub fn redirect_uri(&self) -> String {
        format!(
            "{}/oauth2callback",
            self.cfg.external_url.trim_end_matches('/')
        )
    }
}
