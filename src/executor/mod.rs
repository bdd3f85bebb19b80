pub mod create_table;
pub mod insert;
pub mod predicate;
pub mod scan;
