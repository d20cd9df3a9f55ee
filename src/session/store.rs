//! Session token persistence.
//!
//! Exactly one opaque token is stored per client. Reads are synchronous and
//! never fail: an absent or unreadable token is simply `None`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::secure::SecureString;

/// Storage for the single session credential.
///
/// Implementations must be cheap to read, since every request consults
/// the store before it is sent.
pub trait CredentialStore: Send + Sync {
    fn read(&self) -> Option<SecureString>;
    fn write(&self, token: SecureString);
    fn clear(&self);
}

/// In-memory store. Used by tests and by hosts without a writable disk.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecureString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecureString::new(token))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<SecureString> {
        self.token.read().clone()
    }

    fn write(&self, token: SecureString) {
        *self.token.write() = Some(token);
    }

    fn clear(&self) {
        *self.token.write() = None;
    }
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

/// File-backed store that survives restarts.
///
/// The token is cached in memory; the file is only touched on `write` and
/// `clear`. Disk failures are logged and the cached value stays
/// authoritative for the rest of the process.
pub struct FileCredentialStore {
    path: PathBuf,
    cached: RwLock<Option<SecureString>>,
}

impl FileCredentialStore {
    /// Open the store, loading any token already persisted at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match load_token(&path) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        };
        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn read(&self) -> Option<SecureString> {
        self.cached.read().clone()
    }

    fn write(&self, token: SecureString) {
        let mut guard = self.cached.write();
        if let Err(e) = persist_token(&self.path, &token) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist session token");
        }
        *guard = Some(token);
    }

    fn clear(&self) {
        let mut guard = self.cached.write();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove session file");
            }
        }
        *guard = None;
    }
}

fn load_token(path: &Path) -> std::io::Result<Option<SecureString>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    file.lock_shared()?;
    let mut content = String::new();
    let read = file.read_to_string(&mut content);
    let _ = FileExt::unlock(&file);
    read?;

    let parsed: TokenFile = serde_json::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let token = SecureString::new(parsed.token);
    Ok((!token.is_empty()).then_some(token))
}

fn persist_token(path: &Path, token: &SecureString) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec(&TokenFile {
        token: token.expose().to_string(),
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    let result = (|| {
        file.set_len(0)?;
        file.write_all(&body)?;
        file.sync_all()
    })();
    let _ = FileExt::unlock(&file);
    result
}
