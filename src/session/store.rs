//! Credential persistence behind an injectable interface.
//!
//! The session never reads or writes these itself; front-ends load a
//! [`StoredCredentials`] and turn it into a [`ClientConfig`](crate::ClientConfig).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HfsError, Result};

/// What gets persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl StoredCredentials {
    pub fn new(base_url: &str, username: Option<String>, password: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Load/save/clear for persisted credentials.
pub trait CredentialStore {
    /// `None` when nothing usable is stored.
    fn load(&self) -> Result<Option<StoredCredentials>>;
    fn save(&self, credentials: &StoredCredentials) -> Result<()>;
    /// Returns whether anything was removed.
    fn clear(&self) -> Result<bool>;
}

/// JSON file store, `~/.config/hfsapi/config.json` by default.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user default location.
    ///
    /// The same `~/.config` directory is used on every platform.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            HfsError::InvalidArgument("Cannot determine home directory".to_string())
        })?;
        Ok(Self::new(home.join(".config").join("hfsapi").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredCredentials>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HfsError::io(self.display(), e)),
        };
        // A file without base_url (or not JSON at all) is treated as absent.
        Ok(serde_json::from_str::<StoredCredentials>(&raw).ok())
    }

    fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HfsError::io(self.display(), e))?;
        }
        let json = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, json).map_err(|e| HfsError::io(self.display(), e))
    }

    fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(HfsError::io(self.display(), e)),
        }
    }
}
