//! Client-side storage of the session token.
//!
//! Presence of an unexpired token is the client's only "logged in" signal.
//! Writers are login (set), logout (clear) and every unrecoverable 401
//! (clear); each write is a single operation under a lock.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use tutaller_auth::session::{SESSION_TOKEN_KEY, token_ttl};

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file is not valid JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A stored token with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Key-value accessor for the session token.
pub trait CredentialStore: Send + Sync {
    /// The current token, if one is stored and has not expired.
    fn token(&self) -> Option<String>;

    fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), CredentialStoreError>;

    fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Store `token` with the standard session lifetime.
    fn set_for_session(&self, token: &str) -> Result<(), CredentialStoreError> {
        self.set(token, Utc::now() + token_ttl())
    }
}

/// Process-local store (tests, embedders without persistence).
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated with a session-lifetime token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(StoredToken {
                value: token.into(),
                expires_at: Utc::now() + token_ttl(),
            })),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|t| t.is_live(Utc::now()))
            .map(|t| t.value.clone())
    }

    fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), CredentialStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(StoredToken {
            value: token.to_string(),
            expires_at,
        });
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON-file store: `{ "tutaller_token": { "value": .., "expires_at": .. } }`.
///
/// Other keys in the file are preserved. Writes go through a temp file and a
/// rename so a crash never leaves a truncated file behind.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

type Entries = Map<String, Value>;

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_entries(&self) -> Result<Entries, CredentialStoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let tmp = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&tmp, bytes).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

/// The session entry of the file, ignoring a malformed one.
fn stored_token(entries: &Entries) -> Option<StoredToken> {
    let raw = entries.get(SESSION_TOKEN_KEY)?;
    match serde_json::from_value(raw.clone()) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::warn!(error = %e, "malformed session entry; treating as logged out");
            None
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read_entries() {
            Ok(entries) => stored_token(&entries)
                .filter(|t| t.is_live(Utc::now()))
                .map(|t| t.value),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable credential file; treating as logged out");
                None
            }
        }
    }

    fn set(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries().unwrap_or_default();
        let stored = StoredToken {
            value: token.to_string(),
            expires_at,
        };
        entries.insert(SESSION_TOKEN_KEY.to_string(), serde_json::to_value(stored)?);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(SESSION_TOKEN_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
