use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

use crate::{
    config::DatabaseConfig,
    types::{
        PageId, TableId,
        error::DatabaseError,
        page::{Page, PageType},
    },
};

pub struct DatabaseInfo {
    pub path: PathBuf,
    pub page_size: usize,
    pub file_size: u64,
}

/// Fixed-size page I/O against the single backing file.
///
/// Page `n` lives at byte offset `n * page_size`. Every call goes to the
/// file; nothing is cached here. The file handle sits behind a mutex so
/// readers holding a shared borrow can still seek.
pub struct StorageManager {
    pub db_info: DatabaseInfo,
    file: Mutex<File>,
    next_page_id: PageId,
    sync_writes: bool,
}

impl StorageManager {
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = config.path.as_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let file_size = file.metadata()?.len();

        let storage = Self {
            db_info: DatabaseInfo {
                path: path.to_path_buf(),
                page_size: config.page_size,
                file_size,
            },
            file: Mutex::new(file),
            next_page_id: 0,
            sync_writes: config.sync_writes,
        };

        if file_size % config.page_size as u64 != 0 {
            tracing::warn!(
                path = %path.display(),
                file_size,
                page_size = config.page_size,
                "database file ends with a partial page; trailing bytes are ignored"
            );
        }

        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.db_info.path
    }

    pub fn page_size(&self) -> usize {
        self.db_info.page_size
    }

    fn page_offset(&self, page_id: PageId) -> u64 {
        page_id * self.db_info.page_size as u64
    }

    /// Number of whole pages currently in the file.
    pub fn page_count_on_disk(&self) -> Result<u64, DatabaseError> {
        let len = self.file.lock().metadata()?.len();
        Ok(len / self.db_info.page_size as u64)
    }

    /// Id the next allocated page will receive.
    pub fn next_page_id(&self) -> PageId {
        self.next_page_id
    }

    pub fn set_next_page_id(&mut self, next: PageId) {
        self.next_page_id = next;
    }

    pub fn read_page(&self, page_id: PageId) -> Result<Page, DatabaseError> {
        let mut buffer = vec![0u8; self.db_info.page_size];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(self.page_offset(page_id)))?;
        file.read_exact(&mut buffer)?;
        Ok(Page::from_bytes(page_id, buffer))
    }

    pub fn write_page(&mut self, page: &Page) -> Result<(), DatabaseError> {
        let offset = self.page_offset(page.page_id);
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(page.raw())?;
        if self.sync_writes {
            file.sync_data()?;
        }
        let end = offset + page.size() as u64;
        if end > self.db_info.file_size {
            self.db_info.file_size = end;
        }
        Ok(())
    }

    /// Reserve the next page id and return an initialized, unwritten page.
    pub fn allocate_page(&mut self, page_type: PageType, table_id: TableId) -> Page {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        tracing::debug!(page_id, table_id, ?page_type, "allocated page");
        Page::new(page_id, self.db_info.page_size, page_type, table_id)
    }

    pub fn sync(&self) -> Result<(), DatabaseError> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}
