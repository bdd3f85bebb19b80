//! Database configuration with sensible defaults.

use std::path::PathBuf;

use crate::types::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE, error::DatabaseError};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Backing file; created when missing.
    pub path: PathBuf,

    /// Page size in bytes. The file does not record it, so reopening must
    /// use the size the file was created with.
    pub page_size: usize,

    /// fsync the file after every page write
    pub sync_writes: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("lembar.db"),
            page_size: DEFAULT_PAGE_SIZE,
            sync_writes: false,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>, page_size: usize) -> Self {
        Self {
            path: path.into(),
            page_size,
            ..Self::default()
        }
    }

    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(DatabaseError::InvalidPageSize {
                size: self.page_size,
                min: MIN_PAGE_SIZE,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(())
    }
}

/// Builder for DatabaseConfig
#[derive(Default)]
pub struct DatabaseConfigBuilder {
    config: DatabaseConfig,
}

impl DatabaseConfigBuilder {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn sync_writes(mut self, enabled: bool) -> Self {
        self.config.sync_writes = enabled;
        self
    }

    pub fn build(self) -> DatabaseConfig {
        self.config
    }
}
