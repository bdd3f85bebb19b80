use std::collections::{BTreeMap, btree_map};

use crate::types::{PageId, RowId, TableId};

/// Index key, ordered by table id first, then row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub table_id: TableId,
    pub row_id: RowId,
}

/// Physical location of a row: the page and the offset of its length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPointer {
    pub page_id: PageId,
    pub offset: u16,
}

/// In-memory ordered index for one table.
#[derive(Debug, Clone)]
pub struct RowIndex {
    table_id: TableId,
    entries: BTreeMap<RowKey, RowPointer>,
}

impl RowIndex {
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            entries: BTreeMap::new(),
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Row id the next inserted row receives. Ids are dense from 1.
    pub fn next_row_id(&self) -> RowId {
        self.entries.len() as RowId + 1
    }

    /// Insert or replace; returns the previous pointer for the key, if any.
    pub fn insert(&mut self, row_id: RowId, pointer: RowPointer) -> Option<RowPointer> {
        self.entries.insert(self.key(row_id), pointer)
    }

    pub fn get(&self, row_id: RowId) -> Option<RowPointer> {
        self.entries.get(&self.key(row_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ascending traversal by row id.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    fn key(&self, row_id: RowId) -> RowKey {
        RowKey {
            table_id: self.table_id,
            row_id,
        }
    }
}

pub struct Iter<'a> {
    inner: btree_map::Iter<'a, RowKey, RowPointer>,
}

impl Iterator for Iter<'_> {
    type Item = (RowId, RowPointer);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, ptr)| (key.row_id, *ptr))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
