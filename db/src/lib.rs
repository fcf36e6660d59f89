pub mod error;
pub mod memory;
pub mod sled_db;

pub use error::{DbError, DbResult};
pub use memory::MemoryDb;
pub use sled_db::SledDb;

/// Byte-keyed key/value storage, implemented by [`MemoryDb`] and [`SledDb`].
///
/// `get`/`put`/`delete` are thread-safe; multi-key atomicity is not
/// promised. A missing key and an empty value are indistinguishable through
/// `get` — callers that need to tell them apart must not store empty values.
pub trait Db: Send + Sync {
    /// Writes `value` under `key`, last-write-wins. Returns `true` if this
    /// overwrote an existing value.
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<bool>;

    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Removes `key`. Returns `true` if it was present.
    fn delete(&self, key: &[u8]) -> DbResult<bool>;

    /// Flushes and releases the underlying storage. Idempotent from the
    /// caller's perspective; the engine may refuse operations issued after
    /// this returns.
    fn close(&self) -> DbResult<()>;
}

#[cfg(test)]
mod contract_test {
    use super::*;
    use rstest::rstest;

    fn memory() -> Box<dyn Db> {
        Box::new(MemoryDb::new())
    }

    fn sled_backed() -> Box<dyn Db> {
        let dir = tempfile::tempdir().unwrap();
        Box::new(SledDb::open(dir.path()).unwrap())
    }

    #[rstest]
    #[case(memory())]
    #[case(sled_backed())]
    fn put_then_get_returns_the_stored_value(#[case] db: Box<dyn Db>) {
        assert!(!db.put(b"k", b"v1").unwrap());
        assert_eq!(db.get(b"k").unwrap(), Some(b"v1".to_vec()));
    }

    #[rstest]
    #[case(memory())]
    #[case(sled_backed())]
    fn put_over_an_existing_key_reports_the_overwrite(#[case] db: Box<dyn Db>) {
        db.put(b"k", b"v1").unwrap();
        assert!(db.put(b"k", b"v2").unwrap());
        assert_eq!(db.get(b"k").unwrap(), Some(b"v2".to_vec()));
    }

    #[rstest]
    #[case(memory())]
    #[case(sled_backed())]
    fn get_on_a_missing_key_is_none(#[case] db: Box<dyn Db>) {
        assert_eq!(db.get(b"missing").unwrap(), None);
    }

    #[rstest]
    #[case(memory())]
    #[case(sled_backed())]
    fn delete_removes_the_key_and_reports_prior_presence(#[case] db: Box<dyn Db>) {
        db.put(b"k", b"v").unwrap();
        assert!(db.delete(b"k").unwrap());
        assert_eq!(db.get(b"k").unwrap(), None);
        assert!(!db.delete(b"k").unwrap());
    }

    #[rstest]
    #[case(memory())]
    #[case(sled_backed())]
    fn close_is_idempotent(#[case] db: Box<dyn Db>) {
        db.close().unwrap();
        db.close().unwrap();
    }
}
