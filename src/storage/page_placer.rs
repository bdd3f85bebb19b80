use crate::{
    storage::{row_index::RowPointer, schema::TableSchema, storage_manager::StorageManager},
    types::{
        PAGE_HEADER_SIZE, ROW_LENGTH_PREFIX_SIZE, SLOT_RESERVE_SIZE,
        error::DatabaseError,
        page::{Page, PageType},
    },
};

/// Appends encoded rows to the tail of a table's data page chain.
///
/// Only the last page of the chain is ever considered; when it is missing or
/// too full, a fresh data page is allocated and linked after it.
pub struct PagePlacer<'a> {
    storage: &'a mut StorageManager,
}

impl<'a> PagePlacer<'a> {
    pub fn new(storage: &'a mut StorageManager) -> Self {
        Self { storage }
    }

    /// Largest record an empty data page can accept.
    pub fn max_record_len(page_size: usize) -> usize {
        page_size.saturating_sub(PAGE_HEADER_SIZE + ROW_LENGTH_PREFIX_SIZE + SLOT_RESERVE_SIZE)
    }

    /// Reserve a new, empty data page for `table`. Nothing is written and
    /// the table's chain is left as it is until [`Self::link_data_page`].
    pub fn allocate_data_page(&mut self, table: &TableSchema) -> Page {
        self.storage.allocate_page(PageType::Data, table.table_id)
    }

    /// Attach an already persisted `page` to the end of the table's chain.
    ///
    /// The previous tail (if any) is rewritten with its next-page pointer
    /// set; the chain endpoints only move once that write succeeded.
    pub fn link_data_page(
        &mut self,
        table: &mut TableSchema,
        previous_tail: Option<Page>,
        page: &Page,
    ) -> Result<(), DatabaseError> {
        match previous_tail {
            Some(mut tail) => {
                tail.set_next_page_id(Some(page.page_id));
                self.storage.write_page(&tail)?;
            }
            None => table.first_page_id = Some(page.page_id),
        }
        table.last_page_id = Some(page.page_id);

        tracing::debug!(
            table = %table.table_name,
            page_id = page.page_id,
            "linked new data page"
        );
        Ok(())
    }

    /// Place `record` in the table's last data page, allocating a new page
    /// when it does not fit. Returns where the record's length prefix landed.
    pub fn find_page_for_row(
        &mut self,
        table: &mut TableSchema,
        record: &[u8],
    ) -> Result<RowPointer, DatabaseError> {
        let max = Self::max_record_len(self.storage.page_size());
        if record.len() > max {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "row of {} bytes exceeds the {} bytes a page can hold",
                    record.len(),
                    max
                ),
            });
        }

        let last_page = match table.last_page_id {
            Some(page_id) => Some(self.storage.read_page(page_id)?),
            None => None,
        };

        // `Some(previous_tail)` when the record goes to a fresh page
        let (mut page, link_after) = match last_page {
            Some(page) if page.can_fit(record.len()) => (page, None),
            tail => (self.allocate_data_page(table), Some(tail)),
        };

        let offset = page.append_record(record)?;
        self.storage.write_page(&page)?;
        if let Some(previous_tail) = link_after {
            self.link_data_page(table, previous_tail, &page)?;
        }

        tracing::trace!(
            table = %table.table_name,
            page_id = page.page_id,
            offset,
            len = record.len(),
            "placed row"
        );
        Ok(RowPointer {
            page_id: page.page_id,
            offset,
        })
    }
}
