use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::TokenStoreError;
use crate::paths::token_file_path;
use crate::schema::{StoredToken, TOKEN_RECORD_VERSION};

/// Slot holding at most one credential token.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<StoredToken>, TokenStoreError>;

    /// Replaces the stored token.
    fn save(&self, token: &str) -> Result<StoredToken, TokenStoreError>;

    /// Removes the stored token. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token persisted as `<root>/token.json`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    root: PathBuf,
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = token_file_path(&root);
        Self { root, path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TokenStoreError::io("reading token file", &self.path, source));
            }
        };

        let record = serde_json::from_str::<StoredToken>(&raw).map_err(|source| {
            TokenStoreError::JsonParse {
                path: self.path.clone(),
                source,
            }
        })?;
        validate_record(&self.path, &record)?;

        if record.token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn save(&self, token: &str) -> Result<StoredToken, TokenStoreError> {
        let record = new_record(token)?;
        let serialized = serde_json::to_string_pretty(&record).map_err(|source| {
            TokenStoreError::JsonSerialize {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::create_dir_all(&self.root)
            .map_err(|source| TokenStoreError::io("creating token directory", &self.root, source))?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, serialized)
            .map_err(|source| TokenStoreError::io("writing token file", &temp_path, source))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|source| TokenStoreError::io("replacing token file", &self.path, source))?;

        debug!(path = %self.path.display(), "stored credential token");
        Ok(record)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed credential token");
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TokenStoreError::io("removing token file", &self.path, source)),
        }
    }
}

/// Process-lifetime token slot.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing token, as if saved by an earlier login.
    pub fn with_token(token: &str) -> Result<Self, TokenStoreError> {
        let store = Self::new();
        store.save(token)?;
        Ok(store)
    }

    fn slot(&self) -> MutexGuard<'_, Option<StoredToken>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>, TokenStoreError> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &str) -> Result<StoredToken, TokenStoreError> {
        let record = new_record(token)?;
        *self.slot() = Some(record.clone());
        Ok(record)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.slot().take();
        Ok(())
    }
}

fn new_record(token: &str) -> Result<StoredToken, TokenStoreError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenStoreError::EmptyToken);
    }
    Ok(StoredToken::v1(token, now_rfc3339()?))
}

fn now_rfc3339() -> Result<String, TokenStoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(TokenStoreError::ClockFormat)
}

pub(crate) fn validate_record(path: &Path, record: &StoredToken) -> Result<(), TokenStoreError> {
    if record.version != TOKEN_RECORD_VERSION {
        return Err(TokenStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: record.version,
        });
    }

    if OffsetDateTime::parse(&record.saved_at, &Rfc3339).is_err() {
        return Err(TokenStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: record.saved_at.clone(),
        });
    }

    Ok(())
}
