pub mod page_placer;
pub mod recovery;
pub mod row_index;
pub mod schema;
pub mod storage_manager;
