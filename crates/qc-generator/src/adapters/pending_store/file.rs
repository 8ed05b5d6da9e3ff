//! Durable pending slot backed by one file and an `fs2` lock

use crate::domain::Block;
use crate::ports::{PendingBlockStore, StoreError};
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// On-disk row: `{height, serialized block, crc32 of the block bytes}`
#[derive(Debug, Serialize, Deserialize)]
struct PendingBlockRecord {
    height: u64,
    block: Vec<u8>,
    checksum: u32,
}

/// File-backed pending slot.
///
/// One file holds the single row. Writes go to a temp file that is fsynced
/// and renamed over the slot, so a crash leaves either the old row or the
/// new one. The read-compare-write of [`PendingBlockStore::save`] runs under
/// an exclusive `fs2` lock on a sidecar lock file, which makes the height
/// check a compare-and-swap across every process sharing the slot.
#[derive(Debug, Clone)]
pub struct FilePendingStore {
    path: PathBuf,
}

impl FilePendingStore {
    /// Slot stored at `path`; the lock file sits next to it
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the slot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `path` with `suffix` appended to its full file name
    fn sidecar(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.file_name().map_or_else(OsString::new, OsString::from);
        name.push(suffix);
        path.with_file_name(name)
    }

    fn open_lock(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(Self::sidecar(path, ".lock"))
    }

    fn read_record(path: &Path) -> Result<Option<PendingBlockRecord>, StoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: PendingBlockRecord = bincode::deserialize(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("undecodable record: {e}")))?;
        let actual = crc32fast::hash(&record.block);
        if actual != record.checksum {
            return Err(StoreError::Corrupt(format!(
                "checksum mismatch: expected {:08x}, got {:08x}",
                record.checksum, actual
            )));
        }
        Ok(Some(record))
    }

    fn load_blocking(path: &Path) -> Result<Option<Block>, StoreError> {
        let lock = Self::open_lock(path)?;
        lock.lock_shared()?;

        let Some(record) = Self::read_record(path)? else {
            return Ok(None);
        };
        let block = Block::from_bytes(&record.block)?;
        if block.height != record.height {
            return Err(StoreError::Corrupt(format!(
                "row height {} does not match block height {}",
                record.height, block.height
            )));
        }
        Ok(Some(block))
    }

    fn save_blocking(path: &Path, height: u64, block: Vec<u8>) -> Result<(), StoreError> {
        let lock = Self::open_lock(path)?;
        lock.lock_exclusive()?;

        if let Some(stored) = Self::read_record(path)? {
            if stored.height >= height {
                return Err(StoreError::Conflict {
                    stored: stored.height,
                    attempted: height,
                });
            }
        }

        let record = PendingBlockRecord {
            height,
            checksum: crc32fast::hash(&block),
            block,
        };
        let bytes = bincode::serialize(&record)?;

        let temp_path = Self::sidecar(path, ".tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, path)?;

        tracing::debug!(
            height,
            path = %path.display(),
            "[qc-generator] pending slot written"
        );
        Ok(())
    }
}

#[async_trait]
impl PendingBlockStore for FilePendingStore {
    async fn load(&self) -> Result<Option<Block>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::load_blocking(&path))
            .await
            .map_err(io::Error::other)?
    }

    async fn save(&self, block: &Block) -> Result<(), StoreError> {
        let path = self.path.clone();
        let height = block.height;
        let bytes = block.to_bytes()?;
        tokio::task::spawn_blocking(move || Self::save_blocking(&path, height, bytes))
            .await
            .map_err(io::Error::other)?
    }
}
