use std::collections::HashMap;

use lembar::{
    executor::{
        create_table::CreateTableExecutor,
        insert::{Inserter, TableInserter},
    },
    storage::{
        recovery::RecoveryLoader,
        row_index::RowIndex,
        schema::{ColumnSchema, TableSchema},
        storage_manager::StorageManager,
    },
    types::{
        error::DatabaseError,
        page::{Page, PageType},
        row::Row,
        value::{DataType, Value},
    },
    utils::mock::TempDatabase,
};

fn note_row(id: i64, body: &str) -> Row {
    let mut values = HashMap::new();
    values.insert("id".to_string(), Value::Integer(id));
    values.insert("body".to_string(), Value::Text(body.to_string()));
    Row::new(values)
}

fn note_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", DataType::Integer).not_null(),
        ColumnSchema::new("body", DataType::Text),
    ]
}

#[test]
fn test_recovery_of_empty_file() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("recover_empty")?;
    let mut storage = StorageManager::open(&temp_db.config())?;

    let state = RecoveryLoader::new(&mut storage).run()?;
    assert!(state.schemas.table_schemas.is_empty());
    assert_eq!(state.next_table_id, 1);
    assert_eq!(state.pages_scanned, 0);
    assert_eq!(storage.next_page_id(), 0);
    Ok(())
}

#[test]
fn test_recovery_rebuilds_schemas_and_indices() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("recover_tables")?.with_page_size(128);
    let config = temp_db.config();

    let mut original_pointers = Vec::new();
    {
        let mut storage = StorageManager::open(&config)?;
        let mut notes = CreateTableExecutor::new(&mut storage).create_table(
            1,
            "notes",
            note_columns(),
            "id",
        )?;
        let mut tags = CreateTableExecutor::new(&mut storage).create_table(
            2,
            "tags",
            vec![ColumnSchema::new("tag", DataType::Text)],
            "tag",
        )?;

        let mut notes_index = RowIndex::new(1);
        let mut tags_index = RowIndex::new(2);
        // interleave inserts so the two chains share the file
        for i in 0..12 {
            TableInserter::new(&mut storage, &mut notes, &mut notes_index)
                .insert(note_row(i, &format!("note number {}", i)))?;
            if i % 4 == 0 {
                let mut values = HashMap::new();
                values.insert("tag".to_string(), Value::Text(format!("t{}", i)));
                TableInserter::new(&mut storage, &mut tags, &mut tags_index)
                    .insert(Row::new(values))?;
            }
        }
        original_pointers.extend(notes_index.iter());
        assert!(notes.last_page_id > notes.first_page_id);
        storage.sync()?;
    }

    let mut storage = StorageManager::open(&config)?;
    let page_count = storage.page_count_on_disk()?;
    let state = RecoveryLoader::new(&mut storage).run()?;

    assert_eq!(state.next_table_id, 3);
    assert_eq!(state.pages_scanned, page_count);
    assert_eq!(storage.next_page_id(), page_count);
    assert_eq!(state.rows_indexed, 12 + 3);
    assert_eq!(state.schemas.table_names(), vec!["notes", "tags"]);

    let notes = state.schemas.get_table_schema("notes").ok_or(DatabaseError::TableNotFound {
        name: "notes".to_string(),
    })?;
    assert_eq!(notes.columns, note_columns());
    assert_eq!(notes.primary_key, "id");
    assert_eq!(notes.first_page_id, Some(1));

    let last = notes.last_page_id.ok_or(DatabaseError::IndexNotFound {
        table: "notes".to_string(),
    })?;
    let tail = storage.read_page(last)?;
    assert_eq!(tail.page_type()?, PageType::Data);
    assert_eq!(tail.next_page_id(), None);

    let recovered: Vec<_> = state.row_indices["notes"].iter().collect();
    assert_eq!(recovered, original_pointers);
    assert_eq!(state.row_indices["tags"].len(), 3);
    Ok(())
}

#[test]
fn test_data_page_for_unknown_table_is_corrupt() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("recover_orphan")?.with_page_size(64);
    let config = temp_db.config();
    {
        let mut storage = StorageManager::open(&config)?;
        let page = storage.allocate_page(PageType::Data, 99);
        storage.write_page(&page)?;
    }

    let mut storage = StorageManager::open(&config)?;
    match RecoveryLoader::new(&mut storage).run() {
        Err(DatabaseError::CorruptData { page_id, reason }) => {
            assert_eq!(page_id, 0);
            assert!(reason.contains("99"));
        }
        Err(other) => panic!("Expected CorruptData, got {:?}", other),
        Ok(_) => panic!("Expected CorruptData, got a recovered state"),
    }
    Ok(())
}

#[test]
fn test_data_page_before_its_table_page() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("recover_data_first")?;
    let page_size = temp_db.page_size;

    {
        let mut storage = StorageManager::open(&temp_db.config())?;
        let schema = TableSchema::new(
            1,
            "counters",
            vec![ColumnSchema::new("x", DataType::Integer)],
            "x",
        );
        let mut values = HashMap::new();
        values.insert("x".to_string(), Value::Integer(7));
        let record = Row::new(values).to_bytes(&schema)?;

        let mut data_page = Page::new(0, page_size, PageType::Data, 1);
        data_page.append_record(&record)?;
        storage.write_page(&data_page)?;

        let mut table_page = Page::new(1, page_size, PageType::Table, 1);
        schema.serialize_into(&mut table_page)?;
        storage.write_page(&table_page)?;
    }

    let db = temp_db.create_database()?;
    let rows = db.select_all("counters")?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row_id, 1);
    assert_eq!(rows[0].get("x"), Some(&Value::Integer(7)));

    let schema = db.get_table_schema("counters")?;
    assert_eq!(schema.first_page_id, Some(0));
    assert_eq!(schema.last_page_id, Some(0));
    assert_eq!(db.page_count(), 2);
    Ok(())
}
