use std::collections::HashMap;

use crate::{
    storage::schema::TableSchema,
    types::{
        RowId,
        error::DatabaseError,
        value::{DataType, Value},
    },
};

/*
 * Row encoding
 * ┌──────────────────────────┬─────────────────────────────────────────┐
 * │ null bitmap              │ non-null fields, in schema order        │
 * │ ceil(columns / 8) bytes  │ INTEGER: i64 LE   REAL: f64 LE          │
 * │ bit i set => column null │ TEXT: len u16 LE + bytes   BOOLEAN: 0|1 │
 * └──────────────────────────┴─────────────────────────────────────────┘
 * Field offsets are never stored; they are recovered by replaying the schema.
 */

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_id: RowId,
    pub values: HashMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Row {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { row_id: 0, values }
    }

    pub fn with_row_id(row_id: RowId, values: HashMap<String, Value>) -> Self {
        Self { row_id, values }
    }

    /// The stored value for `column`, or `None` when it is absent or null.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).filter(|v| !v.is_null())
    }

    /// Like [`Row::get`] but yields `Value::Null` for absent columns.
    pub fn value(&self, column: &str) -> &Value {
        self.get(column).unwrap_or(&NULL)
    }

    pub fn null_bitmap_size(column_count: usize) -> usize {
        column_count.div_ceil(8)
    }

    /// Encode the row's values against `schema`.
    pub fn to_bytes(&self, schema: &TableSchema) -> Result<Vec<u8>, DatabaseError> {
        let bitmap_size = Self::null_bitmap_size(schema.columns.len());
        let mut buffer = vec![0u8; bitmap_size];

        for (i, column) in schema.columns.iter().enumerate() {
            let value = match self.get(&column.name) {
                Some(value) => value,
                None => {
                    buffer[i / 8] |= 1 << (i % 8);
                    continue;
                }
            };

            let coerced =
                value
                    .coerce_to(column.data_type)
                    .ok_or_else(|| DatabaseError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.data_type.to_string(),
                        actual: value.type_name().to_string(),
                    })?;

            match coerced {
                Value::Integer(i) => buffer.extend_from_slice(&i.to_le_bytes()),
                Value::Real(r) => buffer.extend_from_slice(&r.to_le_bytes()),
                Value::Text(s) => {
                    let len = u16::try_from(s.len()).map_err(|_| {
                        DatabaseError::SerializationError {
                            details: format!(
                                "value for column '{}' is {} bytes, limit is {}",
                                column.name,
                                s.len(),
                                u16::MAX
                            ),
                        }
                    })?;
                    buffer.extend_from_slice(&len.to_le_bytes());
                    buffer.extend_from_slice(s.as_bytes());
                }
                Value::Boolean(b) => buffer.push(b as u8),
                Value::Null => buffer[i / 8] |= 1 << (i % 8),
            }
        }

        Ok(buffer)
    }

    /// Decode a record produced by [`Row::to_bytes`]. Null columns are left
    /// out of the resulting value map.
    pub fn from_bytes(
        bytes: &[u8],
        schema: &TableSchema,
        row_id: RowId,
    ) -> Result<Self, DatabaseError> {
        let bitmap_size = Self::null_bitmap_size(schema.columns.len());
        if bytes.len() < bitmap_size {
            return Err(DatabaseError::SerializationError {
                details: format!(
                    "row {} has {} bytes, null bitmap needs {}",
                    row_id,
                    bytes.len(),
                    bitmap_size
                ),
            });
        }

        let mut values = HashMap::with_capacity(schema.columns.len());
        let mut cursor = bitmap_size;

        for (i, column) in schema.columns.iter().enumerate() {
            if bytes[i / 8] & (1 << (i % 8)) != 0 {
                continue;
            }

            let value = match column.data_type {
                DataType::Integer => {
                    Value::Integer(i64::from_le_bytes(take::<8>(bytes, &mut cursor, &column.name)?))
                }
                DataType::Real => {
                    Value::Real(f64::from_le_bytes(take::<8>(bytes, &mut cursor, &column.name)?))
                }
                DataType::Text => {
                    let len =
                        u16::from_le_bytes(take::<2>(bytes, &mut cursor, &column.name)?) as usize;
                    if cursor + len > bytes.len() {
                        return Err(truncated(&column.name, cursor + len, bytes.len()));
                    }
                    let text = String::from_utf8(bytes[cursor..cursor + len].to_vec()).map_err(
                        |e| DatabaseError::SerializationError {
                            details: format!("column '{}' is not valid UTF-8: {}", column.name, e),
                        },
                    )?;
                    cursor += len;
                    Value::Text(text)
                }
                DataType::Boolean => {
                    Value::Boolean(take::<1>(bytes, &mut cursor, &column.name)?[0] != 0)
                }
            };
            values.insert(column.name.clone(), value);
        }

        Ok(Row { row_id, values })
    }
}

fn take<const N: usize>(
    bytes: &[u8],
    cursor: &mut usize,
    column: &str,
) -> Result<[u8; N], DatabaseError> {
    if *cursor + N > bytes.len() {
        return Err(truncated(column, *cursor + N, bytes.len()));
    }
    let mut buf = [0u8; N];
    buf.copy_from_slice(&bytes[*cursor..*cursor + N]);
    *cursor += N;
    Ok(buf)
}

fn truncated(column: &str, needed: usize, available: usize) -> DatabaseError {
    DatabaseError::SerializationError {
        details: format!(
            "incomplete value for column '{}': need {} bytes, have {}",
            column, needed, available
        ),
    }
}
