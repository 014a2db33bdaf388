//! Stored account sessions
//!
//! Provides:
//! - The `SessionRecord` persisted for every managed account
//! - A storage seam (`SessionStorage`) with JSON-file and in-memory backends
//! - Helpers for appending records, positional lookup and rotating API credentials

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Marker that replaces the leading `+` of a phone number in session names.
pub const PLUS_MARKER: &str = "plus";

/// One stored account: credentials plus the derived session name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: String,
    pub phone: String,
    pub api_id: String,
    pub api_hash: String,
}

impl SessionRecord {
    /// Build a record for `phone`, deriving its storage-safe name.
    pub fn new(phone: &str, api_id: &str, api_hash: &str) -> Self {
        Self {
            name: session_name_for_phone(phone),
            phone: phone.to_string(),
            api_id: api_id.to_string(),
            api_hash: api_hash.to_string(),
        }
    }

    /// Path of the MTProto session file kept by the client library.
    pub fn session_file(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.session", self.name))
    }
}

/// Derive a session name from a phone number: `+5212345` → `plus5212345`.
pub fn session_name_for_phone(phone: &str) -> String {
    match phone.strip_prefix('+') {
        Some(rest) => format!("{PLUS_MARKER}{rest}"),
        None => phone.to_string(),
    }
}

/// Load/save contract for the ordered list of session records.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Vec<SessionRecord>>;
    fn save(&self, sessions: &[SessionRecord]) -> Result<()>;
}

/// Sessions stored as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an empty array if it does not exist yet.
    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %self.path.display(), "Creating empty sessions file");
        fs::write(&self.path, "[]")?;
        Ok(())
    }
}

impl SessionStorage for JsonFileStore {
    fn load(&self) -> Result<Vec<SessionRecord>> {
        self.ensure_exists()?;
        let content = fs::read_to_string(&self.path)?;
        let sessions: Vec<SessionRecord> = serde_json::from_str(&content)?;
        Ok(sessions)
    }

    fn save(&self, sessions: &[SessionRecord]) -> Result<()> {
        let payload = serde_json::to_string(sessions)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// Process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<SessionRecord>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
        }
    }
}

impl SessionStorage for MemoryStore {
    fn load(&self) -> Result<Vec<SessionRecord>> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| Error::IoError(std::io::Error::other(e.to_string())))?;
        Ok(guard.clone())
    }

    fn save(&self, sessions: &[SessionRecord]) -> Result<()> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| Error::IoError(std::io::Error::other(e.to_string())))?;
        *guard = sessions.to_vec();
        Ok(())
    }
}

/// Append a record and persist the whole list.
pub fn append_session(store: &dyn SessionStorage, record: SessionRecord) -> Result<()> {
    let mut sessions = store.load()?;
    sessions.push(record);
    store.save(&sessions)
}

/// Load the record at position `index` (zero-based) in the store.
pub fn session_at(store: &dyn SessionStorage, index: usize) -> Result<SessionRecord> {
    store
        .load()?
        .into_iter()
        .nth(index)
        .ok_or_else(|| Error::SessionNotFound(format!("#{}", index + 1)))
}

/// Replace `api_id`/`api_hash` of the record at `index`; everything else is kept.
///
/// Names may repeat, so the record is addressed by position. It must still
/// be called `name`, otherwise the store changed underneath and nothing is
/// written.
pub fn update_credentials(
    store: &dyn SessionStorage,
    index: usize,
    name: &str,
    api_id: &str,
    api_hash: &str,
) -> Result<SessionRecord> {
    let mut sessions = store.load()?;
    let record = sessions
        .get_mut(index)
        .filter(|s| s.name == name)
        .ok_or_else(|| Error::SessionNotFound(name.to_string()))?;

    record.api_id = api_id.to_string();
    record.api_hash = api_hash.to_string();
    let updated = record.clone();

    store.save(&sessions)?;
    Ok(updated)
}
