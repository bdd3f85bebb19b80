use crate::types::{
    FREE_OFFSET_OFFSET, NEXT_PAGE_OFFSET, PAGE_HEADER_SIZE, PAGE_TYPE_OFFSET, PageId,
    ROW_COUNT_OFFSET, ROW_LENGTH_PREFIX_SIZE, SLOT_RESERVE_SIZE, TABLE_ID_OFFSET, TableId,
    error::DatabaseError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Free = 0,
    Table = 1,
    Data = 2,
    Index = 3,
}

impl PageType {
    pub fn from_u8(value: u8) -> Result<Self, DatabaseError> {
        match value {
            0 => Ok(PageType::Free),
            1 => Ok(PageType::Table),
            2 => Ok(PageType::Data),
            3 => Ok(PageType::Index),
            _ => Err(DatabaseError::InvalidPageType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/*
 * Page Layout on Disk
 * ┌─────────────────────────────────────────────────────────────────┐
 * │                    PAGE HEADER (17 bytes)                       │
 * │  type(1) | table_id(4) | row_count(2) | next_page(8) | free(2)  │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                   PAYLOAD (grows upward)                        │
 * │  Table page: serialized schema                                  │
 * │  Data page:  [len(2)|row bytes] [len(2)|row bytes] ...          │
 * ├─────────────────────────────────────────────────────────────────┤
 * │                    FREE SPACE                                   │
 * └─────────────────────────────────────────────────────────────────┘
 */

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_id: PageId,
    pub data: Vec<u8>,
}

impl Page {
    /// A fresh page with an initialized header and an empty payload.
    pub fn new(page_id: PageId, page_size: usize, page_type: PageType, table_id: TableId) -> Self {
        let mut page = Self {
            page_id,
            data: vec![0; page_size],
        };
        page.data[PAGE_TYPE_OFFSET] = page_type.as_u8();
        page.write_u32(TABLE_ID_OFFSET, table_id);
        page.set_row_count(0);
        page.set_next_page_id(None);
        page.set_free_offset(PAGE_HEADER_SIZE as u16);
        page
    }

    pub fn from_bytes(page_id: PageId, data: Vec<u8>) -> Self {
        Self { page_id, data }
    }

    pub fn raw(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn page_type(&self) -> Result<PageType, DatabaseError> {
        PageType::from_u8(self.data[PAGE_TYPE_OFFSET])
    }

    pub fn table_id(&self) -> TableId {
        self.read_u32(TABLE_ID_OFFSET)
    }

    pub fn row_count(&self) -> u16 {
        self.read_u16(ROW_COUNT_OFFSET)
    }

    pub fn set_row_count(&mut self, count: u16) {
        self.write_u16(ROW_COUNT_OFFSET, count);
    }

    /// Next page in the owning table's chain; 0 on disk means none.
    pub fn next_page_id(&self) -> Option<PageId> {
        match self.read_u64(NEXT_PAGE_OFFSET) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn set_next_page_id(&mut self, next: Option<PageId>) {
        self.write_u64(NEXT_PAGE_OFFSET, next.unwrap_or(0));
    }

    pub fn free_offset(&self) -> u16 {
        self.read_u16(FREE_OFFSET_OFFSET)
    }

    pub fn set_free_offset(&mut self, offset: u16) {
        self.write_u16(FREE_OFFSET_OFFSET, offset);
    }

    pub fn available_space(&self) -> usize {
        self.size().saturating_sub(self.free_offset() as usize)
    }

    /// Whether a record of `record_len` bytes plus its length prefix fits,
    /// keeping `SLOT_RESERVE_SIZE` bytes spare.
    pub fn can_fit(&self, record_len: usize) -> bool {
        self.free_offset() as usize + record_len + ROW_LENGTH_PREFIX_SIZE + SLOT_RESERVE_SIZE
            <= self.size()
    }

    /// Appends a length-prefixed record at the free offset and returns the
    /// offset of its length prefix.
    pub fn append_record(&mut self, record: &[u8]) -> Result<u16, DatabaseError> {
        if !self.can_fit(record.len()) {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "record of {} bytes does not fit in page {} ({} bytes free)",
                    record.len(),
                    self.page_id,
                    self.available_space()
                ),
            });
        }

        let offset = self.free_offset();
        let start = offset as usize;
        let body = start + ROW_LENGTH_PREFIX_SIZE;
        self.write_u16(start, record.len() as u16);
        self.data[body..body + record.len()].copy_from_slice(record);

        self.set_row_count(self.row_count() + 1);
        self.set_free_offset((body + record.len()) as u16);
        Ok(offset)
    }

    /// The record whose length prefix starts at `offset`.
    pub fn record_at(&self, offset: u16) -> Result<&[u8], DatabaseError> {
        let start = offset as usize;
        if start + ROW_LENGTH_PREFIX_SIZE > self.size() {
            return Err(self.corrupt(format!("record prefix at {} runs past end of page", start)));
        }
        let len = self.read_u16(start) as usize;
        let body = start + ROW_LENGTH_PREFIX_SIZE;
        if body + len > self.size() {
            return Err(self.corrupt(format!(
                "record of {} bytes at {} runs past end of page",
                len, start
            )));
        }
        Ok(&self.data[body..body + len])
    }

    /// Offsets of every record on a data page, walking `row_count` records
    /// forward from the end of the header.
    pub fn record_offsets(&self) -> Result<Vec<u16>, DatabaseError> {
        let count = self.row_count() as usize;
        let mut offsets = Vec::with_capacity(count);
        let mut offset = PAGE_HEADER_SIZE;
        for i in 0..count {
            if offset + ROW_LENGTH_PREFIX_SIZE > self.size() {
                return Err(self.corrupt(format!(
                    "reached end of page data while reading row {} of {}",
                    i, count
                )));
            }
            let record = self.record_at(offset as u16)?;
            offsets.push(offset as u16);
            offset += ROW_LENGTH_PREFIX_SIZE + record.len();
        }
        Ok(offsets)
    }

    pub(crate) fn corrupt(&self, reason: String) -> DatabaseError {
        DatabaseError::CorruptData {
            page_id: self.page_id,
            reason,
        }
    }

    pub(crate) fn read_u16(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.data[at], self.data[at + 1]])
    }

    pub(crate) fn write_u16(&mut self, at: usize, value: u16) {
        self.data[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn read_u32(&self, at: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[at..at + 4]);
        u32::from_le_bytes(buf)
    }

    fn write_u32(&mut self, at: usize, value: u32) {
        self.data[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn read_u64(&self, at: usize) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.data[at..at + 8]);
        u64::from_le_bytes(buf)
    }

    fn write_u64(&mut self, at: usize, value: u64) {
        self.data[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }
}
