pub mod error;
pub mod page;
pub mod row;
pub mod value;

// Common type aliases
pub type PageId = u64;
pub type RowId = u64;
pub type TableId = u32;

pub const DEFAULT_PAGE_SIZE: usize = 4096;
pub const MIN_PAGE_SIZE: usize = 64;
pub const MAX_PAGE_SIZE: usize = u16::MAX as usize; // free offset is a u16

/*
 * Page header (17 bytes, little-endian)
 * ┌──────────┬─────────────┬─────────────┬──────────────┬──────────────┐
 * │ type (1) │ table_id(4) │ row_count(2)│ next_page(8) │ free_off (2) │
 * └──────────┴─────────────┴─────────────┴──────────────┴──────────────┘
 */
pub const PAGE_HEADER_SIZE: usize = 17;
pub const PAGE_TYPE_OFFSET: usize = 0;
pub const TABLE_ID_OFFSET: usize = 1;
pub const ROW_COUNT_OFFSET: usize = 5;
pub const NEXT_PAGE_OFFSET: usize = 7;
pub const FREE_OFFSET_OFFSET: usize = 15;

pub const ROW_LENGTH_PREFIX_SIZE: usize = 2;
pub const SLOT_RESERVE_SIZE: usize = 4; // safety margin kept free at the end of every data page
