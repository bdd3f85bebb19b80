use crate::{
    storage::{
        row_index::{self, RowIndex},
        schema::TableSchema,
        storage_manager::StorageManager,
    },
    types::{PageId, error::DatabaseError, page::Page, row::Row},
};

pub trait Scanner {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError>;
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError>;
    fn reset(&mut self) -> Result<(), DatabaseError>;
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self { scanner }
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Row, DatabaseError>;
    fn next(&mut self) -> Option<Self::Item> {
        match self.scanner.scan() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Visits a table's rows in ascending row id order by following its index.
///
/// Rows sharing a page are decoded from a single read: the scanner keeps the
/// most recently loaded page and only goes back to the file when the next
/// pointer names a different one.
pub struct IndexScanner<'a> {
    storage: &'a StorageManager,
    schema: &'a TableSchema,
    index: &'a RowIndex,
    entries: row_index::Iter<'a>,
    current_page: Option<Page>,
}

impl<'a> IndexScanner<'a> {
    pub fn new(storage: &'a StorageManager, schema: &'a TableSchema, index: &'a RowIndex) -> Self {
        Self {
            storage,
            schema,
            index,
            entries: index.iter(),
            current_page: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.schema.table_name
    }

    fn load_page(&mut self, page_id: PageId) -> Result<&Page, DatabaseError> {
        let page = match self.current_page.take() {
            Some(page) if page.page_id == page_id => page,
            _ => self.storage.read_page(page_id)?,
        };
        Ok(self.current_page.insert(page))
    }
}

impl Scanner for IndexScanner<'_> {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError> {
        let Some((row_id, pointer)) = self.entries.next() else {
            return Ok(None);
        };

        let schema = self.schema;
        let page = self.load_page(pointer.page_id)?;
        let record = page.record_at(pointer.offset)?;
        let row = Row::from_bytes(record, schema, row_id)
            .map_err(|e| page.corrupt(format!("row {}: {}", row_id, e)))?;
        Ok(Some(row))
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError> {
        let mut rows = Vec::with_capacity(batch_size);
        while rows.len() < batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<(), DatabaseError> {
        self.entries = self.index.iter();
        Ok(())
    }
}
