#![allow(dead_code)]

use std::path::PathBuf;

use level_sync::store::SqliteStore;
use tempfile::TempDir;

pub struct TestDb {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
}

pub fn setup_store() -> (TestDb, SqliteStore) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    let store = SqliteStore::open(&path).expect("open store");
    (TestDb { _dir: dir, path }, store)
}
