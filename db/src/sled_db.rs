use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DbError, DbResult};
use crate::Db;

/// A [`Db`] backed by a [`sled::Db`] tree, the reference corpus's usual
/// choice for byte-keyed persistent state.
pub struct SledDb {
    db: sled::Db,
    closed: AtomicBool,
}

impl SledDb {
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        log::debug!("opened sled db at {}", path.as_ref().display());
        let db = sled::open(path)?;
        Ok(SledDb { db, closed: AtomicBool::new(false) })
    }

    /// The wrapped [`sled::Db`] handle, for engine-specific maintenance
    /// (compaction, snapshots) that the [`Db`] trait doesn't expose.
    pub fn underlying(&self) -> &sled::Db {
        &self.db
    }

    fn check_open(&self) -> DbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(DbError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Db for SledDb {
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<bool> {
        self.check_open()?;
        Ok(self.db.insert(key, value)?.is_some())
    }

    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.db.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn delete(&self, key: &[u8]) -> DbResult<bool> {
        self.check_open()?;
        Ok(self.db.remove(key)?.is_some())
    }

    fn close(&self) -> DbResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            log::debug!("closing sled db, flushing");
            self.db.flush()?;
        }
        Ok(())
    }
}
