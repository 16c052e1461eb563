//! On-disk cache: one `<id>.json` file per record

use crate::error::CacheError;
use crate::{check_key, EntityCache};
use async_trait::async_trait;
use lstats_model::DetailRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Flat directory of serialized detail payloads
///
/// Each file holds the record exactly as the detail endpoint would return
/// it. Writes land in a temporary sibling and are renamed into place, so
/// readers see either no entry or a complete one.
#[derive(Debug, Clone)]
pub struct FsEntityCache {
    root: PathBuf,
}

impl FsEntityCache {
    /// Open cache rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    /// `CacheError::Io` if the directory cannot be created
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| CacheError::io_error(&root, e))?;
        tracing::debug!(root = %root.display(), "opened entity cache");
        Ok(Self { root })
    }

    /// Cache root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the entry for `id`
    #[inline]
    #[must_use]
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{EXTENSION}"))
    }

    fn temp_path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!(".{id}.{EXTENSION}.tmp"))
    }
}

#[async_trait]
impl EntityCache for FsEntityCache {
    async fn try_read(&self, id: &str) -> Result<Option<DetailRecord>, CacheError> {
        check_key(id)?;
        let path = self.path_for(id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io_error(path, e)),
        };

        let record = serde_json::from_slice(&bytes).map_err(|e| CacheError::corrupt(id, e))?;
        Ok(Some(record))
    }

    async fn write(&self, id: &str, record: &DetailRecord) -> Result<(), CacheError> {
        check_key(id)?;
        let bytes = serde_json::to_vec(record).map_err(|e| CacheError::Serialize {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

        let tmp = self.temp_path_for(id);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| CacheError::io_error(&tmp, e))?;

        let path = self.path_for(id);
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CacheError::io_error(&path, e))?;

        tracing::trace!(id, bytes = bytes.len(), "cached detail record");
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return 0;
        };
        let count = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                let path = entry.path();
                path.extension().is_some_and(|ext| ext == EXTENSION)
                    && !entry.file_name().to_string_lossy().starts_with('.')
            })
            .count();
        count as u64
    }
}
