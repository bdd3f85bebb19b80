use std::{collections::HashMap, path::Path};

use parking_lot::RwLock;

use crate::{
    config::DatabaseConfig,
    executor::{
        create_table::CreateTableExecutor,
        insert::{Inserter, TableInserter},
        predicate::{ComparisonOp, Predicate, RowPredicate},
        scan::{IndexScanner, ScanIterator},
    },
    storage::{
        recovery::RecoveryLoader,
        row_index::RowIndex,
        schema::{ColumnSchema, SchemaManager, TableSchema},
        storage_manager::StorageManager,
    },
    types::{
        RowId, TableId,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

struct DatabaseState {
    storage: StorageManager,
    schemas: SchemaManager,
    row_indices: HashMap<String, RowIndex>,
    next_table_id: TableId,
}

impl DatabaseState {
    fn table(&self, table_name: &str) -> Result<(&TableSchema, &RowIndex)> {
        let schema = self
            .schemas
            .get_table_schema(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })?;
        let index = self
            .row_indices
            .get(table_name)
            .ok_or_else(|| DatabaseError::IndexNotFound {
                table: table_name.to_string(),
            })?;
        Ok((schema, index))
    }
}

/// A single-file table store.
///
/// Mutations (`create_table`, `insert`) take the write lock; every read
/// takes the shared lock. All file I/O happens while the lock is held.
pub struct Database {
    config: DatabaseConfig,
    state: RwLock<DatabaseState>,
}

impl Database {
    /// Open or create the file at `path` using `page_size`-byte pages.
    pub fn open(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref(), page_size))
    }

    /// Open with an explicit configuration. An existing, non-empty file is
    /// scanned in full to rebuild the table registry and row indices.
    pub fn open_with_config(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let mut storage = StorageManager::open(&config)?;

        let state = if storage.db_info.file_size > 0 {
            let recovered = RecoveryLoader::new(&mut storage).run()?;
            DatabaseState {
                storage,
                schemas: recovered.schemas,
                row_indices: recovered.row_indices,
                next_table_id: recovered.next_table_id,
            }
        } else {
            DatabaseState {
                storage,
                schemas: SchemaManager::new(),
                row_indices: HashMap::new(),
                next_table_id: 1,
            }
        };

        tracing::info!(
            path = %config.path.display(),
            page_size = config.page_size,
            tables = state.schemas.table_schemas.len(),
            "opened database"
        );

        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    /// Flush everything to disk and release the file.
    pub fn close(self) -> Result<()> {
        let state = self.state.into_inner();
        state.storage.sync()?;
        tracing::info!(path = %self.config.path.display(), "closed database");
        Ok(())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn create_table(
        &self,
        table_name: &str,
        columns: Vec<ColumnSchema>,
        primary_key: &str,
    ) -> Result<()> {
        let mut state = self.state.write();
        if state.schemas.table_exists(table_name) {
            return Err(DatabaseError::TableAlreadyExists {
                name: table_name.to_string(),
            });
        }

        let table_id = state.next_table_id;
        let schema = CreateTableExecutor::new(&mut state.storage).create_table(
            table_id,
            table_name,
            columns,
            primary_key,
        )?;

        state.next_table_id += 1;
        state
            .row_indices
            .insert(table_name.to_string(), RowIndex::new(table_id));
        state.schemas.add_table_schema(schema);
        Ok(())
    }

    /// Insert one row given as `(column, value)` pairs and return its row id.
    ///
    /// Nothing is written unless the values pass validation against the
    /// table's schema.
    pub fn insert<I, K, V>(&self, table_name: &str, values: I) -> Result<RowId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let values: HashMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let mut guard = self.state.write();
        let DatabaseState {
            storage,
            schemas,
            row_indices,
            ..
        } = &mut *guard;

        let schema = schemas
            .get_table_schema_mut(table_name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })?;
        let index = row_indices
            .get_mut(table_name)
            .ok_or_else(|| DatabaseError::IndexNotFound {
                table: table_name.to_string(),
            })?;

        TableInserter::new(storage, schema, index).insert(Row::new(values))
    }

    /// Every row of `table_name` accepted by `predicate`, in row id order.
    pub fn select<P>(&self, table_name: &str, predicate: &P) -> Result<Vec<Row>>
    where
        P: RowPredicate + ?Sized,
    {
        let state = self.state.read();
        let (schema, index) = state.table(table_name)?;

        let scanner = IndexScanner::new(&state.storage, schema, index);
        let mut rows = Vec::new();
        for row in ScanIterator::new(scanner) {
            let row = row?;
            if predicate.evaluate(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    pub fn select_all(&self, table_name: &str) -> Result<Vec<Row>> {
        self.select(table_name, &Predicate::True)
    }

    pub fn select_by_id(&self, table_name: &str, row_id: RowId) -> Result<Row> {
        let state = self.state.read();
        let (schema, index) = state.table(table_name)?;

        let pointer = index
            .get(row_id)
            .ok_or_else(|| DatabaseError::RowNotFound {
                table: table_name.to_string(),
                row_id,
            })?;
        let page = state.storage.read_page(pointer.page_id)?;
        let record = page.record_at(pointer.offset)?;
        Row::from_bytes(record, schema, row_id)
            .map_err(|e| page.corrupt(format!("row {}: {}", row_id, e)))
    }

    /// Filter on a single column with an operator string (`=`, `==`, `!=`,
    /// `<>`, `<`, `<=`, `>`, `>=`, `LIKE`).
    ///
    /// The value must be storable in the column (null is accepted and
    /// compares below every stored value). `LIKE` additionally needs a text
    /// pattern.
    pub fn select_where(
        &self,
        table_name: &str,
        column_name: &str,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Vec<Row>> {
        let value = value.into();
        let predicate = {
            let state = self.state.read();
            let schema = state.schemas.get_table_schema(table_name).ok_or_else(|| {
                DatabaseError::TableNotFound {
                    name: table_name.to_string(),
                }
            })?;
            let column =
                schema
                    .get_column(column_name)
                    .ok_or_else(|| DatabaseError::ColumnNotFound {
                        name: column_name.to_string(),
                        table: table_name.to_string(),
                    })?;

            if value.coerce_to(column.data_type).is_none() {
                return Err(DatabaseError::TypeMismatch {
                    column: column_name.to_string(),
                    expected: column.data_type.to_string(),
                    actual: value.type_name().to_string(),
                });
            }

            let predicate = Predicate::from_parts(column_name, op, value)?;
            if let Predicate::Comparison {
                op: ComparisonOp::Like,
                value,
                ..
            } = &predicate
            {
                if value.as_str().is_none() {
                    return Err(DatabaseError::TypeMismatch {
                        column: column_name.to_string(),
                        expected: "TEXT pattern".to_string(),
                        actual: value.type_name().to_string(),
                    });
                }
            }
            predicate
        };

        self.select(table_name, &predicate)
    }

    /// Table names in creation order.
    pub fn list_tables(&self) -> Vec<String> {
        self.state.read().schemas.table_names()
    }

    pub fn get_row_count(&self, table_name: &str) -> Result<usize> {
        let state = self.state.read();
        let (_, index) = state.table(table_name)?;
        Ok(index.len())
    }

    pub fn get_table_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.state
            .read()
            .schemas
            .get_table_schema(table_name)
            .cloned()
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })
    }

    /// Pages allocated so far, including the ones recovered at open.
    pub fn page_count(&self) -> u64 {
        self.state.read().storage.next_page_id()
    }
}
