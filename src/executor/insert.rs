use std::collections::HashMap;

use crate::{
    storage::{
        page_placer::PagePlacer, row_index::RowIndex, schema::TableSchema,
        storage_manager::StorageManager,
    },
    types::{RowId, error::DatabaseError, row::Row, value::Value},
};

/// Trait for inserting data into database tables
pub trait Inserter {
    /// Insert a single row into the table, returning its assigned row id
    fn insert(&mut self, row: Row) -> Result<RowId, DatabaseError>;

    /// Insert multiple rows in a batch operation
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<Vec<RowId>, DatabaseError>;

    /// Get the table name this inserter operates on
    fn table_name(&self) -> &str;
}

/// Check caller-supplied values against `schema` and coerce them to the
/// column types.
///
/// Columns are checked in schema order: a NOT NULL column that is absent or
/// null fails with `MissingRequiredColumn`, a value that cannot be coerced
/// fails with `TypeMismatch`. Names that match no column are reported after
/// that. Nullable columns left out (or given null) are dropped from the
/// result.
pub fn validate_row_values(
    schema: &TableSchema,
    values: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>, DatabaseError> {
    let mut validated = HashMap::with_capacity(values.len());

    for column in &schema.columns {
        let value = match values.get(&column.name) {
            Some(value) if !value.is_null() => value,
            _ if column.not_null => {
                return Err(DatabaseError::MissingRequiredColumn {
                    name: column.name.clone(),
                    table: schema.table_name.clone(),
                });
            }
            _ => continue,
        };

        let coerced =
            value
                .coerce_to(column.data_type)
                .ok_or_else(|| DatabaseError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type.to_string(),
                    actual: value.type_name().to_string(),
                })?;
        validated.insert(column.name.clone(), coerced);
    }

    let mut unknown: Vec<&String> = values
        .keys()
        .filter(|name| schema.get_column(name).is_none())
        .collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(DatabaseError::UnknownColumn {
            name: (*name).clone(),
            table: schema.table_name.clone(),
        });
    }

    Ok(validated)
}

/// Appends rows to one table: validates, encodes, places the record and
/// records its location in the table's index.
pub struct TableInserter<'a> {
    storage: &'a mut StorageManager,
    schema: &'a mut TableSchema,
    index: &'a mut RowIndex,
}

impl<'a> TableInserter<'a> {
    pub fn new(
        storage: &'a mut StorageManager,
        schema: &'a mut TableSchema,
        index: &'a mut RowIndex,
    ) -> Self {
        Self {
            storage,
            schema,
            index,
        }
    }

    fn encode(&self, row: &Row) -> Result<Vec<u8>, DatabaseError> {
        let validated = validate_row_values(self.schema, &row.values)?;
        Row::new(validated).to_bytes(self.schema)
    }

    fn place(&mut self, record: &[u8]) -> Result<RowId, DatabaseError> {
        let pointer = PagePlacer::new(self.storage).find_page_for_row(self.schema, record)?;
        let row_id = self.index.next_row_id();
        self.index.insert(row_id, pointer);

        tracing::trace!(
            table = %self.schema.table_name,
            row_id,
            page_id = pointer.page_id,
            "inserted row"
        );
        Ok(row_id)
    }
}

impl Inserter for TableInserter<'_> {
    fn insert(&mut self, row: Row) -> Result<RowId, DatabaseError> {
        let record = self.encode(&row)?;
        self.place(&record)
    }

    /// Every row is validated and encoded before the first one is written,
    /// so a bad row leaves the table untouched.
    fn insert_batch(&mut self, rows: Vec<Row>) -> Result<Vec<RowId>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let records = rows
            .iter()
            .map(|row| self.encode(row))
            .collect::<Result<Vec<_>, _>>()?;

        let max = PagePlacer::max_record_len(self.storage.page_size());
        if let Some((i, record)) = records.iter().enumerate().find(|(_, r)| r.len() > max) {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "row {} of batch is {} bytes, a page holds at most {}",
                    i,
                    record.len(),
                    max
                ),
            });
        }

        records.iter().map(|record| self.place(record)).collect()
    }

    fn table_name(&self) -> &str {
        &self.schema.table_name
    }
}
