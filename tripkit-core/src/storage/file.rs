//! File-backed key/value store.
//!
//! Each slot is a single file under the store directory. Slots are created by
//! writing a temp file and hard-linking it into place, which fails if the
//! target already exists, so concurrent initializers (threads or processes)
//! cannot overwrite each other and readers never observe a partial value.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rand::{rngs::OsRng, RngCore};

use super::error::{StorageError, StorageResult};
use super::traits::KeyValueStore;

const SLOT_EXTENSION: &str = "slot";

/// Key/value store persisting one file per slot in a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Opens (creating if needed) the store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| {
            StorageError::Unavailable(format!(
                "cannot create storage directory {}: {err}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Returns the directory backing this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> StorageResult<PathBuf> {
        let valid = !slot.is_empty()
            && !slot.starts_with('.')
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidSlot(slot.to_string()));
        }
        Ok(self.root.join(format!("{slot}.{SLOT_EXTENSION}")))
    }

    fn temp_path(&self, slot: &str) -> PathBuf {
        let mut suffix = [0u8; 8];
        OsRng.fill_bytes(&mut suffix);
        self.root
            .join(format!(".{slot}.{}.tmp", hex::encode(suffix)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, slot: &str) -> StorageResult<Option<String>> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(format!("read {}", path.display()), err)),
        }
    }

    fn insert_if_absent(&self, slot: &str, value: &str) -> StorageResult<String> {
        let path = self.slot_path(slot)?;
        if let Some(existing) = self.get(slot)? {
            return Ok(existing);
        }

        let temp = self.temp_path(slot);
        let write_temp = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()
        };
        if let Err(err) = write_temp() {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::io(format!("write {}", temp.display()), err));
        }

        let linked = fs::hard_link(&temp, &path);
        let _ = fs::remove_file(&temp);
        match linked {
            Ok(()) => Ok(value.to_string()),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                log::debug!("slot {slot} was initialized concurrently, adopting stored value");
                self.get(slot)?.ok_or_else(|| {
                    StorageError::io(
                        format!("read {}", path.display()),
                        std::io::Error::new(ErrorKind::NotFound, "slot vanished after race"),
                    )
                })
            }
            Err(err) => Err(StorageError::io(format!("link {}", path.display()), err)),
        }
    }

    fn remove(&self, slot: &str) -> StorageResult<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(format!("remove {}", path.display()), err)),
        }
    }
}
