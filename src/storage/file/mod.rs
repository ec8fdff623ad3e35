//! File-based storage backend.
//!
//! This backend stores data as JSON files. Writers hold an exclusive lock on
//! a sibling `.lock` file and replace the data file by renaming a fully
//! written temp file over it, so readers never see a partial document.
//! Suitable for development and single-node deployments.
//!
//! Directory structure:
//! ```text
//! data/
//! ├── sequences/
//! │   ├── {inventory}.json
//! │   └── {inventory}.lock
//! └── configs/
//!     ├── {inventory}.json
//!     └── {inventory}.lock
//! ```

mod config;
mod sequence;

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::config::FileStorageConfig;
use crate::domain::{InventoryId, SequenceState, StoredConfiguration};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::{ConfigStorage, SequenceStorage, Storage};

pub use config::FileConfigStorage;
pub use sequence::FileSequenceStorage;

/// File-based storage implementation.
pub struct FileStorage {
    /// Base data directory.
    base_dir: PathBuf,
    /// Sequence storage.
    sequence_storage: FileSequenceStorage,
    /// Config storage.
    config_storage: FileConfigStorage,
}

impl FileStorage {
    /// Create a new file storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();

        Self::ensure_directories(&base_dir)?;

        Ok(Self {
            sequence_storage: FileSequenceStorage::new(base_dir.join("sequences")),
            config_storage: FileConfigStorage::new(base_dir.join("configs")),
            base_dir,
        })
    }

    fn ensure_directories(base_dir: &Path) -> StorageResult<()> {
        for dir in [
            base_dir.to_path_buf(),
            base_dir.join("sequences"),
            base_dir.join("configs"),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                StorageError::FileIO(format!("Failed to create directory {}: {e}", dir.display()))
            })?;
        }

        Ok(())
    }
}

/// Longest stem written verbatim; common file systems cap names at 255 bytes.
const MAX_STEM_LEN: usize = 200;

/// Map an inventory id onto a file stem.
///
/// ASCII letters, digits, `-` and `_` are kept; every other byte becomes
/// `.xx` (lowercase hex). Stems longer than [`MAX_STEM_LEN`] are replaced by
/// `~` plus a name-based UUID of the id. `~` never appears in a direct
/// encoding, so distinct inventories never share a file.
fn encode_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, ".{byte:02x}");
        }
    }

    if out.len() > MAX_STEM_LEN {
        return format!(
            "~{}",
            Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).simple()
        );
    }
    out
}

/// Exclusive lock on `{stem}.lock`, released on drop.
struct WriteLock(File);

impl WriteLock {
    fn acquire(data_path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(data_path.with_extension("lock"))?;
        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        Ok(Self(file))
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}

/// Replace `path` with `bytes` via a synced temp file and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let tmp_path = path.with_extension("json.tmp");

    let mut tmp = File::create(&tmp_path)?;
    tmp.write_all(bytes)?;
    tmp.sync_all()?;
    drop(tmp);

    std::fs::rename(&tmp_path, path)?;

    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        File::open(parent)?.sync_all()?;
    }

    Ok(())
}

/// Load a JSON document, `None` if the file does not exist.
///
/// An empty or unparsable file is an error, never a missing record.
fn load_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if bytes.is_empty() {
        return Err(StorageError::Serialization(format!(
            "{} is empty",
            path.display()
        )));
    }

    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[async_trait]
impl SequenceStorage for FileStorage {
    async fn allocate(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        self.sequence_storage
            .allocate(inventory_id, start_value)
            .await
    }

    async fn peek(&self, inventory_id: &InventoryId, start_value: u64) -> StorageResult<u64> {
        self.sequence_storage.peek(inventory_id, start_value).await
    }

    async fn get_state(&self, inventory_id: &InventoryId) -> StorageResult<Option<SequenceState>> {
        self.sequence_storage.get_state(inventory_id).await
    }
}

#[async_trait]
impl ConfigStorage for FileStorage {
    async fn save_configuration(&self, config: &StoredConfiguration) -> StorageResult<()> {
        self.config_storage.save_configuration(config).await
    }

    async fn get_configuration(
        &self,
        inventory_id: &InventoryId,
    ) -> StorageResult<Option<StoredConfiguration>> {
        self.config_storage.get_configuration(inventory_id).await
    }

    async fn delete_configuration(&self, inventory_id: &InventoryId) -> StorageResult<bool> {
        self.config_storage.delete_configuration(inventory_id).await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn health_check(&self) -> StorageResult<()> {
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }

        // Check write access.
        let test_file = self.base_dir.join(".health_check");
        tokio::fs::write(&test_file, b"ok")
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
        tokio::fs::remove_file(&test_file)
            .await
            .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ElementSpec, IdConfiguration};
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };
        let storage = FileStorage::new(&config).unwrap();
        (storage, temp_dir)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.health_check().await.is_ok());
        assert_eq!(storage.backend_name(), "file");
    }

    #[tokio::test]
    async fn test_deleting_config_keeps_counter() {
        let (storage, _temp) = create_test_storage();
        let id = InventoryId::parse("inv-1").unwrap();

        let config = StoredConfiguration::new(
            id.clone(),
            IdConfiguration::empty().with_element(ElementSpec::guid()),
        );
        storage.save_configuration(&config).await.unwrap();
        assert_eq!(storage.allocate(&id, 1).await.unwrap(), 1);

        assert!(storage.delete_configuration(&id).await.unwrap());
        assert_eq!(storage.peek(&id, 1).await.unwrap(), 2);
    }

    #[test]
    fn test_encode_file_name() {
        assert_eq!(encode_file_name("simple"), "simple");
        assert_eq!(encode_file_name("with-dash_under"), "with-dash_under");
        assert_eq!(encode_file_name("a/b"), "a.2fb");
        assert_eq!(encode_file_name("a.b"), "a.2eb");
        assert_eq!(encode_file_name("../x"), ".2e.2e.2fx");
        assert_ne!(encode_file_name("a/b"), encode_file_name("a_b"));
    }

    #[test]
    fn test_long_names_get_fixed_length_stems() {
        let long_ascii = "a".repeat(255);
        let long_utf8 = "é".repeat(100);

        let first = encode_file_name(&long_ascii);
        let second = encode_file_name(&long_utf8);

        assert!(first.starts_with('~'));
        assert_eq!(first.len(), 33);
        assert_eq!(second.len(), 33);
        assert_ne!(first, second);
        assert_eq!(first, encode_file_name(&long_ascii));

        // Short names keep the readable form.
        assert_eq!(encode_file_name(&"a".repeat(200)), "a".repeat(200));
    }

    #[tokio::test]
    async fn test_long_inventory_ids_round_trip() {
        let (storage, _temp) = create_test_storage();

        for raw in ["a".repeat(255), "é".repeat(100)] {
            let id = InventoryId::parse(&raw).unwrap();

            assert_eq!(storage.allocate(&id, 1).await.unwrap(), 1);
            assert_eq!(storage.peek(&id, 1).await.unwrap(), 2);

            let config = StoredConfiguration::new(
                id.clone(),
                IdConfiguration::empty().with_element(ElementSpec::guid()),
            );
            storage.save_configuration(&config).await.unwrap();
            assert_eq!(storage.get_configuration(&id).await.unwrap(), Some(config));
        }
    }

    #[test]
    fn test_load_json_rejects_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("x.json");

        assert!(load_json::<SequenceState>(&path).unwrap().is_none());

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            load_json::<SequenceState>(&path),
            Err(StorageError::Serialization(_))
        ));
    }
}
