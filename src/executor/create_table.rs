use std::collections::HashSet;

use crate::{
    storage::{
        page_placer::PagePlacer,
        schema::{ColumnSchema, TableSchema},
        storage_manager::StorageManager,
    },
    types::{PAGE_HEADER_SIZE, TableId, error::DatabaseError, page::PageType, value::DataType},
};

/// Writes a new table to disk: its schema page followed by an empty first
/// data page.
pub struct CreateTableExecutor<'a> {
    storage: &'a mut StorageManager,
}

impl<'a> CreateTableExecutor<'a> {
    pub fn new(storage: &'a mut StorageManager) -> Self {
        Self { storage }
    }

    /// Validate column definitions. An empty primary key is allowed.
    pub fn validate_columns(
        table_name: &str,
        columns: &[ColumnSchema],
        primary_key: &str,
    ) -> Result<(), DatabaseError> {
        let mut column_names = HashSet::new();
        for column in columns {
            if !column_names.insert(column.name.as_str()) {
                return Err(DatabaseError::SerializationError {
                    details: format!(
                        "duplicate column '{}' in table '{}'",
                        column.name, table_name
                    ),
                });
            }
        }

        if !primary_key.is_empty() && !column_names.contains(primary_key) {
            return Err(DatabaseError::PrimaryKeyColumnNotFound {
                column: primary_key.to_string(),
                table: table_name.to_string(),
            });
        }

        Ok(())
    }

    /// Persist the table and return its schema with both chain endpoints
    /// pointing at the new, empty data page.
    pub fn create_table(
        &mut self,
        table_id: TableId,
        table_name: &str,
        columns: Vec<ColumnSchema>,
        primary_key: &str,
    ) -> Result<TableSchema, DatabaseError> {
        Self::validate_columns(table_name, &columns, primary_key)?;

        let mut schema = TableSchema::new(table_id, table_name, columns, primary_key);
        let schema_len = PAGE_HEADER_SIZE + schema.serialized_size();
        if schema_len > self.storage.page_size() {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "schema for table '{}' needs {} bytes, page holds {}",
                    table_name,
                    schema_len,
                    self.storage.page_size()
                ),
            });
        }

        let mut table_page = self.storage.allocate_page(PageType::Table, table_id);
        schema.serialize_into(&mut table_page)?;
        self.storage.write_page(&table_page)?;

        let data_page = PagePlacer::new(self.storage).allocate_data_page(&schema);
        self.storage.write_page(&data_page)?;
        PagePlacer::new(self.storage).link_data_page(&mut schema, None, &data_page)?;

        tracing::debug!(
            table = %schema.table_name,
            table_id,
            table_page = table_page.page_id,
            data_page = data_page.page_id,
            "created table"
        );
        Ok(schema)
    }
}

/// Builder for creating table schemas
pub struct TableSchemaBuilder {
    table_name: String,
    columns: Vec<ColumnSchema>,
    primary_key: Option<String>,
}

impl TableSchemaBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_key: None,
        }
    }

    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnSchema::new(name, data_type));
        self
    }

    pub fn add_not_null_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnSchema::new(name, data_type).not_null());
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Returns `(table_name, columns, primary_key)`. Without an explicit
    /// primary key the first column is used.
    pub fn build(self) -> Result<(String, Vec<ColumnSchema>, String), DatabaseError> {
        let primary_key = match self.primary_key {
            Some(pk) => pk,
            None => self
                .columns
                .first()
                .map(|col| col.name.clone())
                .ok_or_else(|| DatabaseError::SerializationError {
                    details: format!("table '{}' must have at least one column", self.table_name),
                })?,
        };

        CreateTableExecutor::validate_columns(&self.table_name, &self.columns, &primary_key)?;
        Ok((self.table_name, self.columns, primary_key))
    }
}
