use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    config::DatabaseConfig,
    database::Database,
    types::{DEFAULT_PAGE_SIZE, error::DatabaseError},
};

/// A database file inside a private temporary directory.
///
/// The directory (and the file) are removed when this value is dropped.
pub struct TempDatabase {
    pub path: PathBuf,
    pub page_size: usize,
    database: Option<Database>,
    dir: TempDir,
}

impl TempDatabase {
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_prefix("lembar_test")
    }

    pub fn with_prefix(prefix: &str) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        Ok(Self {
            path: dir.path().join(format!("{}.db", prefix)),
            page_size: DEFAULT_PAGE_SIZE,
            database: None,
            dir,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.path, self.page_size)
    }

    /// Open (or return the already open) database.
    pub fn create_database(&mut self) -> Result<&Database, DatabaseError> {
        let db = match self.database.take() {
            Some(db) => db,
            None => Database::open_with_config(self.config())?,
        };
        Ok(self.database.insert(db))
    }

    pub fn get_database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Close the open database, if any, and open the same file again.
    pub fn reopen(&mut self) -> Result<&Database, DatabaseError> {
        self.close()?;
        self.create_database()
    }

    pub fn close(&mut self) -> Result<(), DatabaseError> {
        match self.database.take() {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        self.database = None;
    }
}
