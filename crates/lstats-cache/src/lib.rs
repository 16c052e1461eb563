//! lstats entity cache
//!
//! Read-through/write-through store of `DetailRecord`s keyed by user id.
//!
//! # Contract
//!
//! - A present entry is trusted unconditionally: no TTL, no revalidation
//! - Entries are never evicted
//! - `write` persists whatever it is given; callers only hand it records
//!   that are up to date
//!
//! # Architecture
//!
//! ```text
//! DetailFetcher ──try_read(id)──▶ EntityCache ◀──write(id, record)── DetailFetcher
//!                                     │
//!                     ┌───────────────┴───────────────┐
//!              FsEntityCache                 MemoryEntityCache
//!         <root>/<id>.json blobs            moka, unbounded
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod fs;
pub mod memory;

use async_trait::async_trait;
use lstats_model::DetailRecord;

pub use error::CacheError;
pub use fs::FsEntityCache;
pub use memory::MemoryEntityCache;

/// Storage seam for detail records
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Cached record for `id`, if one was written
    ///
    /// # Errors
    /// - `CacheError::InvalidKey` if `id` cannot name an entry
    /// - `CacheError::Corrupt` if an entry exists but does not parse
    /// - `CacheError::Io` on storage failure
    async fn try_read(&self, id: &str) -> Result<Option<DetailRecord>, CacheError>;

    /// Persist `record` under `id`, replacing any previous entry
    ///
    /// # Errors
    /// - `CacheError::InvalidKey` if `id` cannot name an entry
    /// - `CacheError::Io` on storage failure
    async fn write(&self, id: &str, record: &DetailRecord) -> Result<(), CacheError>;

    /// Approximate number of stored entries
    fn entry_count(&self) -> u64;
}

/// Validate an id for use as a cache key
///
/// Ids come from a remote API and end up as file names.
pub(crate) fn check_key(id: &str) -> Result<(), CacheError> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if bad {
        return Err(CacheError::InvalidKey(id.to_string()));
    }
    Ok(())
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_that_escape_the_root_are_rejected() {
        for id in ["", ".", "..", "a/b", "..\\x", "nul\0"] {
            assert!(matches!(check_key(id), Err(CacheError::InvalidKey(_))), "{id:?}");
        }
    }

    #[test]
    fn ordinary_ids_are_accepted() {
        for id in ["abc", "1f2e-33aa", "user.name", "xyz..1"] {
            assert!(check_key(id).is_ok(), "{id:?}");
        }
    }
}
