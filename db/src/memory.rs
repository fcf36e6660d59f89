use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{DbError, DbResult};
use crate::Db;

/// A `Mutex<HashMap<..>>`-backed [`Db`], used in tests and as a dependency-free
/// default for embedding.
#[derive(Default)]
pub struct MemoryDb {
    map: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
}

impl MemoryDb {
    pub fn new() -> Self {
        MemoryDb::default()
    }

    /// The backing map, for inspection in tests or tooling. Not part of the
    /// [`Db`] trait since its shape is specific to this implementation.
    pub fn underlying(&self) -> &Mutex<HashMap<Vec<u8>, Vec<u8>>> {
        &self.map
    }

    fn check_open(&self) -> DbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(DbError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Db for MemoryDb {
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<bool> {
        self.check_open()?;
        let mut map = self.map.lock().expect("memory db mutex poisoned");
        Ok(map.insert(key.to_vec(), value.to_vec()).is_some())
    }

    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_open()?;
        let map = self.map.lock().expect("memory db mutex poisoned");
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> DbResult<bool> {
        self.check_open()?;
        let mut map = self.map.lock().expect("memory db mutex poisoned");
        Ok(map.remove(key).is_some())
    }

    fn close(&self) -> DbResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            log::debug!("closing memory db, {} keys held", self.map.lock().expect("memory db mutex poisoned").len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_db_is_empty() {
        let db = MemoryDb::new();
        assert_eq!(db.get(b"anything").unwrap(), None);
    }

    #[test]
    fn underlying_reflects_writes_made_through_the_trait() {
        let db = MemoryDb::new();
        db.put(b"k", b"v").unwrap();
        assert_eq!(db.underlying().lock().unwrap().get(b"k".as_slice()), Some(&b"v".to_vec()));
    }

    #[test]
    fn operations_after_close_are_rejected() {
        let db = MemoryDb::new();
        db.put(b"k", b"v").unwrap();
        db.close().unwrap();
        assert!(matches!(db.get(b"k"), Err(DbError::Closed)));
        assert!(matches!(db.put(b"k", b"v2"), Err(DbError::Closed)));
        assert!(matches!(db.delete(b"k"), Err(DbError::Closed)));
    }
}
