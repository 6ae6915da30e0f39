//! Named private-key persistence.
//!
//! # File format
//!
//! [`FileKeyStore`] writes one file per key at `<dir>/<name>` holding
//! the 32-byte private scalar as 64 lowercase hex characters with no
//! prefix and no trailing newline. Loading also accepts a `0x` prefix
//! and surrounding whitespace.
//!
//! # Concurrency
//!
//! Saves to the same name are mutually exclusive: each name has its own
//! lock, held for the whole temp-file write and rename. Saves to
//! different names proceed in parallel.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use zeroize::Zeroizing;

use etherwallet_crypto::signing::{KeyPair, PrivateKey};
use etherwallet_types::{EtherwalletError, Result};

/// Longest accepted entry name.
pub const MAX_NAME_LEN: usize = 128;

// ---------------------------------------------------------------------------
// KeyStore trait
// ---------------------------------------------------------------------------

/// Storage for named private keys.
pub trait KeyStore: Send + Sync {
    /// Stores `key` under `name`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// `StorageError` if the name is invalid or the write fails.
    fn save(&self, name: &str, key: &PrivateKey) -> Result<()>;

    /// Loads the key stored under `name`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no entry exists, `CurveError` if the stored scalar
    /// is not a valid key, `StorageError` on I/O failure.
    fn load(&self, name: &str) -> Result<KeyPair>;
}

/// Checks that `name` is usable as a single path component.
///
/// Accepted: 1..=[`MAX_NAME_LEN`] characters from `[A-Za-z0-9_.-]`, not
/// starting with `.`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(EtherwalletError::StorageError {
            reason: format!("key name must be 1..={MAX_NAME_LEN} characters"),
        });
    }
    if name.starts_with('.') {
        return Err(EtherwalletError::StorageError {
            reason: format!("key name {name:?} must not start with '.'"),
        });
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(EtherwalletError::StorageError {
            reason: format!("key name {name:?} contains invalid character {bad:?}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileKeyStore
// ---------------------------------------------------------------------------

/// [`KeyStore`] keeping one hex file per key in a directory.
pub struct FileKeyStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileKeyStore {
    /// Opens a store rooted at `dir`. The directory is created on the
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `name`.
    pub fn entry_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }

    /// Returns the lock serializing saves to `name`.
    ///
    /// Entries only the map still references are dropped first, so the
    /// map holds at most one entry per in-flight save plus the new one.
    fn entry_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(name.to_owned()).or_default())
    }
}

impl KeyStore for FileKeyStore {
    fn save(&self, name: &str, key: &PrivateKey) -> Result<()> {
        let path = self.entry_path(name)?;
        let lock = self.entry_lock(name);
        let _guard = lock.lock();

        fs::create_dir_all(&self.dir).map_err(|e| EtherwalletError::StorageError {
            reason: format!("failed to create key directory {}: {e}", self.dir.display()),
        })?;

        let bytes = key.to_bytes();
        let encoded = Zeroizing::new(hex::encode(&*bytes));
        let tmp_path = self.dir.join(format!(".{name}.tmp"));
        write_private_file(&tmp_path, encoded.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            EtherwalletError::StorageError {
                reason: format!("failed to write key file: {e}"),
            }
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            EtherwalletError::StorageError {
                reason: format!("failed to rename key file: {e}"),
            }
        })?;

        tracing::info!(name, path = %path.display(), "key saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<KeyPair> {
        let path = self.entry_path(name)?;

        let contents = match fs::read_to_string(&path) {
            Ok(s) => Zeroizing::new(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EtherwalletError::NotFound { name: name.into() });
            }
            Err(e) => {
                return Err(EtherwalletError::StorageError {
                    reason: format!("failed to read key file {}: {e}", path.display()),
                });
            }
        };

        let key = PrivateKey::from_hex(&contents)?;
        tracing::info!(name, "key loaded");
        Ok(KeyPair::from_private(key))
    }
}

/// Creates `path` with owner-only permissions and writes `bytes`.
fn write_private_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let _ = fs::remove_file(path);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// MemoryKeyStore
// ---------------------------------------------------------------------------

/// In-process [`KeyStore`], for tests and embedding.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<String, Zeroizing<[u8; 32]>>>,
}

impl MemoryKeyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&self, name: &str, key: &PrivateKey) -> Result<()> {
        validate_name(name)?;
        self.entries.lock().insert(name.to_owned(), key.to_bytes());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<KeyPair> {
        let entries = self.entries.lock();
        let bytes = entries
            .get(name)
            .ok_or_else(|| EtherwalletError::NotFound { name: name.into() })?;
        Ok(KeyPair::from_private(PrivateKey::from_bytes(bytes)?))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
