//! # Persisted Storage
//!
//! Key/value storage for session data that must outlive the process,
//! mirroring what a browser keeps in local storage.

use crate::error::{ApiError, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Single-token key written by older releases
pub const LEGACY_TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const ELEVATED_SESSION_KEY: &str = "elevated_session_detected";
/// Backend cookies (`name=value; ...`) kept so cookie sessions survive a restart
pub const COOKIES_KEY: &str = "cookies";

/// Every key cleared on logout
pub const SESSION_KEYS: [&str; 6] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    LEGACY_TOKEN_KEY,
    USER_KEY,
    ELEVATED_SESSION_KEY,
    COOKIES_KEY,
];

/// Persisted key/value storage
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every session-related key
    fn clear_session(&self) -> Result<()> {
        for key in SESSION_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }

    /// Whether the elevated-privilege marker is recorded
    fn elevated_session(&self) -> bool {
        self.get(ELEVATED_SESSION_KEY).as_deref() == Some("true")
    }
}

/// Process-local storage, used when nothing needs to survive a restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Storage("memory storage poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Storage("memory storage poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
///
/// The file is replaced atomically on every mutation and is only readable by
/// its owner. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        tracing::debug!("Opened session storage at {}", path.display());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| {
            ApiError::Storage(format!("failed to create {}: {e}", dir.display()))
        })?;

        let text = serde_json::to_string_pretty(entries)?;
        let write_failed = |e: std::io::Error| {
            ApiError::Storage(format!("failed to write {}: {e}", self.path.display()))
        };

        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_failed)?;
        restrict_to_owner(file.as_file()).map_err(write_failed)?;
        file.write_all(text.as_bytes()).map_err(write_failed)?;
        file.as_file().sync_all().map_err(write_failed)?;
        file.persist(&self.path).map_err(|e| write_failed(e.error))?;
        Ok(())
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Storage("file storage poisoned".to_string()))?;
        f(&mut entries);
        self.persist(&entries)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(unix)]
fn restrict_to_owner(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}
