use std::collections::HashMap;

use crate::types::{
    PAGE_HEADER_SIZE, PageId, TableId,
    error::DatabaseError,
    page::Page,
    value::DataType,
};

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            not_null: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn serialized_size(&self) -> usize {
        2 + self.name.len() + 1 + 1
    }
}

/// A table definition plus the endpoints of its data page chain.
///
/// `primary_key` is recorded and validated against the columns at creation
/// time but is not enforced as a uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub table_id: TableId,
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
    pub primary_key: String,
    pub first_page_id: Option<PageId>,
    pub last_page_id: Option<PageId>,
}

impl TableSchema {
    pub fn new(
        table_id: TableId,
        table_name: impl Into<String>,
        columns: Vec<ColumnSchema>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            table_id,
            table_name: table_name.into(),
            columns,
            primary_key: primary_key.into(),
            first_page_id: None,
            last_page_id: None,
        }
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Bytes the schema occupies in a table page payload.
    pub fn serialized_size(&self) -> usize {
        2 + self.table_name.len()
            + 2
            + 2
            + self.primary_key.len()
            + self.columns.iter().map(ColumnSchema::serialized_size).sum::<usize>()
    }

    /// Write the schema into a table page payload and advance its free offset.
    ///
    /// Field order: name len + name, column count, primary key len + primary
    /// key, then per column name len + name, type code, not-null flag.
    pub fn serialize_into(&self, page: &mut Page) -> Result<(), DatabaseError> {
        let end = PAGE_HEADER_SIZE + self.serialized_size();
        if end > page.size() {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "schema for table '{}' needs {} bytes, page holds {}",
                    self.table_name,
                    end,
                    page.size()
                ),
            });
        }

        let mut offset = PAGE_HEADER_SIZE;
        write_str(page, &mut offset, &self.table_name)?;
        write_len(page, &mut offset, self.columns.len(), "column count")?;
        write_str(page, &mut offset, &self.primary_key)?;
        for column in &self.columns {
            write_str(page, &mut offset, &column.name)?;
            page.data[offset] = column.data_type.as_u8();
            page.data[offset + 1] = column.not_null as u8;
            offset += 2;
        }

        page.set_free_offset(offset as u16);
        Ok(())
    }

    /// Read a schema back from a table page. The table id comes from the
    /// page header; page chain endpoints are left unset.
    pub fn from_page(page: &Page) -> Result<Self, DatabaseError> {
        let mut reader = PageReader::new(page);

        let table_name = reader.read_str()?;
        let column_count = reader.read_u16()? as usize;
        let primary_key = reader.read_str()?;

        let mut columns = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            let name = reader.read_str()?;
            let code = reader.read_u8()?;
            let data_type = DataType::from_u8(code).ok_or_else(|| {
                page.corrupt(format!("unknown type code {} for column '{}'", code, name))
            })?;
            let not_null = reader.read_u8()? != 0;
            columns.push(ColumnSchema {
                name,
                data_type,
                not_null,
            });
        }

        Ok(Self::new(page.table_id(), table_name, columns, primary_key))
    }
}

fn write_len(
    page: &mut Page,
    offset: &mut usize,
    len: usize,
    what: &str,
) -> Result<(), DatabaseError> {
    let len = u16::try_from(len).map_err(|_| DatabaseError::SerializationError {
        details: format!("{} {} exceeds {}", what, len, u16::MAX),
    })?;
    page.write_u16(*offset, len);
    *offset += 2;
    Ok(())
}

fn write_str(page: &mut Page, offset: &mut usize, s: &str) -> Result<(), DatabaseError> {
    write_len(page, offset, s.len(), "name length")?;
    page.data[*offset..*offset + s.len()].copy_from_slice(s.as_bytes());
    *offset += s.len();
    Ok(())
}

struct PageReader<'a> {
    page: &'a Page,
    offset: usize,
}

impl<'a> PageReader<'a> {
    fn new(page: &'a Page) -> Self {
        Self {
            page,
            offset: PAGE_HEADER_SIZE,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DatabaseError> {
        if self.offset + len > self.page.size() {
            return Err(self.page.corrupt(format!(
                "schema field at {} ({} bytes) runs past end of page",
                self.offset, len
            )));
        }
        let bytes = &self.page.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8, DatabaseError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DatabaseError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_str(&mut self) -> Result<String, DatabaseError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| self.page.corrupt(format!("schema name is not valid UTF-8: {}", e)))
    }
}

/// Registry of table schemas keyed by name
#[derive(Debug, Clone, Default)]
pub struct SchemaManager {
    pub table_schemas: HashMap<String, TableSchema>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table_schema(&mut self, schema: TableSchema) {
        self.table_schemas.insert(schema.table_name.clone(), schema);
    }

    pub fn get_table_schema(&self, table_name: &str) -> Option<&TableSchema> {
        self.table_schemas.get(table_name)
    }

    pub fn get_table_schema_mut(&mut self, table_name: &str) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(table_name)
    }

    pub fn get_by_id_mut(&mut self, table_id: TableId) -> Option<&mut TableSchema> {
        self.table_schemas
            .values_mut()
            .find(|schema| schema.table_id == table_id)
    }

    /// Table names in creation (table id) order.
    pub fn table_names(&self) -> Vec<String> {
        let mut schemas: Vec<&TableSchema> = self.table_schemas.values().collect();
        schemas.sort_by_key(|schema| schema.table_id);
        schemas.iter().map(|s| s.table_name.clone()).collect()
    }

    pub fn table_exists(&self, table_name: &str) -> bool {
        self.table_schemas.contains_key(table_name)
    }

    pub fn max_table_id(&self) -> TableId {
        self.table_schemas
            .values()
            .map(|schema| schema.table_id)
            .max()
            .unwrap_or(0)
    }
}
