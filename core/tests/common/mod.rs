//! Helpers shared by the integration tests that need a database file.

use std::path::PathBuf;

/// SQLite database file removed, with its WAL side files, on drop.
pub struct TempDb(PathBuf);

impl TempDb {
    pub fn new() -> Self {
        Self(std::env::temp_dir().join(format!("shg-ledger-{}.db", uuid::Uuid::new_v4())))
    }

    pub fn path(&self) -> String {
        self.0.to_string_lossy().into_owned()
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path()));
        }
    }
}
