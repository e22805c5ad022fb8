//! Persistence layer.
//!
//! Loads and saves the order list as a single JSON array on disk.
//! The file is owned by this daemon but appended to by external
//! producers between passes, so every save rewrites the whole array
//! and every load re-reads it from scratch.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::Order;

/// Errors from the order store.
///
/// A missing file is not an error — it loads as an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read orders file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("orders file {path} is not a valid JSON array")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write orders file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File-backed store for the order list.
pub struct OrderStore {
    path: PathBuf,
}

impl OrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full order list.
    ///
    /// A missing file is a fresh start and returns an empty list. A file
    /// that exists but does not parse as a JSON array is an error; the
    /// file is left untouched so nothing a producer wrote is lost.
    pub fn load(&self) -> Result<Vec<Order>, StoreError> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No orders file found, treating as empty");
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        let orders: Vec<Order> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), count = orders.len(), "Orders loaded");
        Ok(orders)
    }

    /// Persist the full order list, overwriting prior content.
    ///
    /// Writes to a temporary file in the same directory and renames it
    /// over the target, so a crash mid-write never leaves a truncated
    /// array behind.
    pub fn save(&self, orders: &[Order]) -> Result<(), StoreError> {
        // serde_json's pretty printer uses the 2-space indent the
        // producers of this file expect.
        let json = serde_json::to_string_pretty(orders).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), count = orders.len(), "Orders saved");
        Ok(())
    }

    /// Raw file contents, for tests and diagnostics.
    pub fn read_raw(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, OrderStatus};

    fn temp_store() -> OrderStore {
        let mut p = std::env::temp_dir();
        p.push(format!("ordermon_test_{}.json", uuid::Uuid::new_v4()));
        OrderStore::new(p)
    }

    #[test]
    fn test_save_and_load() {
        let store = temp_store();
        let orders = vec![Order::pending("A-1"), Order::pending("A-2")];
        store.save(&orders).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id.as_deref(), Some("A-1"));
        assert_eq!(loaded[1].status, Some(OrderStatus::Pending));

        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = OrderStore::new("/tmp/ordermon_nonexistent_12345.json");
        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_malformed_is_error_and_untouched() {
        let store = temp_store();
        std::fs::write(store.path(), "{ not an array").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));

        // The broken file must not be rewritten or cleared.
        assert_eq!(store.read_raw().unwrap(), "{ not an array");

        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_save_is_pretty_printed_array() {
        let store = temp_store();
        store.save(&[Order::pending("A-1")]).unwrap();

        let raw = store.read_raw().unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\n  {"));

        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let store = temp_store();
        store.save(&[Order::pending("A-1")]).unwrap();

        let tmp = store.path().with_extension("json.tmp");
        assert!(!tmp.exists());

        std::fs::remove_file(store.path()).unwrap();
    }

    #[test]
    fn test_save_overwrites_fully() {
        let store = temp_store();
        store.save(&[Order::pending("A-1"), Order::pending("A-2")]).unwrap();
        store.save(&[Order::pending("A-2")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_deref(), Some("A-2"));

        std::fs::remove_file(store.path()).unwrap();
    }
}
