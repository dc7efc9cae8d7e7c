use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use crate::creds::StoredCredential;

/// Durable per-session credential storage backing the credential provider.
/// One SQLite file per workspace; every table is keyed by session id so
/// credentials are never shared across sessions.
pub struct CredentialStore {
    conn: Connection,
}

pub fn open_store(workspace: &Path) -> anyhow::Result<CredentialStore> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("classledger.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(CredentialStore { conn })
}

/// In-memory variant for tests; same schema, no file on disk.
pub fn open_in_memory() -> anyhow::Result<CredentialStore> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(CredentialStore { conn })
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS client_secrets(
            session_id TEXT PRIMARY KEY,
            blob TEXT NOT NULL,
            uploaded_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS credentials(
            session_id TEXT PRIMARY KEY,
            credential_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS auth_states(
            state TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

impl CredentialStore {
    pub fn save_client_secret(&self, session_id: &str, blob: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO client_secrets(session_id, blob, uploaded_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET blob = ?2, uploaded_at = ?3",
            (session_id, blob, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    pub fn load_client_secret(&self, session_id: &str) -> anyhow::Result<Option<String>> {
        let blob = self
            .conn
            .query_row(
                "SELECT blob FROM client_secrets WHERE session_id = ?",
                [session_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(blob)
    }

    pub fn save_credential(
        &self,
        session_id: &str,
        credential: &StoredCredential,
    ) -> anyhow::Result<()> {
        let json = serde_json::to_string(credential)?;
        self.conn.execute(
            "INSERT INTO credentials(session_id, credential_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET credential_json = ?2, updated_at = ?3",
            (session_id, json, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    pub fn load_credential(&self, session_id: &str) -> anyhow::Result<Option<StoredCredential>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT credential_json FROM credentials WHERE session_id = ?",
                [session_id],
                |r| r.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn delete_credential(&self, session_id: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM credentials WHERE session_id = ?", [session_id])?;
        Ok(())
    }

    /// Records a pending authorization `state` token for the session that
    /// started the flow.
    pub fn put_auth_state(&self, state: &str, session_id: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_states(state, session_id, created_at)
             VALUES (?1, ?2, ?3)",
            (state, session_id, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Resolves a callback `state` token to its session and consumes it;
    /// a second callback with the same token finds nothing.
    pub fn take_auth_state(&self, state: &str) -> anyhow::Result<Option<String>> {
        let session_id: Option<String> = self
            .conn
            .query_row(
                "SELECT session_id FROM auth_states WHERE state = ?",
                [state],
                |r| r.get(0),
            )
            .optional()?;
        if session_id.is_some() {
            self.conn
                .execute("DELETE FROM auth_states WHERE state = ?", [state])?;
        }
        Ok(session_id)
    }
}
