use std::fs;

use lembar::{
    ColumnSchema, DataType, Database, DatabaseConfig, DatabaseError, Value,
    utils::mock::TempDatabase,
};

fn create_notes(db: &Database) -> Result<(), DatabaseError> {
    db.create_table(
        "notes",
        vec![
            ColumnSchema::new("id", DataType::Integer).not_null(),
            ColumnSchema::new("body", DataType::Text),
            ColumnSchema::new("score", DataType::Real),
            ColumnSchema::new("pinned", DataType::Boolean),
        ],
        "id",
    )
}

fn insert_note(db: &Database, id: i64) -> Result<u64, DatabaseError> {
    db.insert(
        "notes",
        [
            ("id", Value::from(id)),
            ("body", Value::from(format!("note body number {}", id))),
            ("score", if id % 5 == 0 { Value::Null } else { Value::from(id as f64 / 4.0) }),
            ("pinned", Value::from(id % 7 == 0)),
        ],
    )
}

#[test]
fn test_close_and_reopen_preserves_contents() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("persist_reopen")?;
    let (before_rows, before_pages) = {
        let db = temp_db.create_database()?;
        create_notes(db)?;
        db.create_table(
            "tags",
            vec![ColumnSchema::new("tag", DataType::Text).not_null()],
            "tag",
        )?;
        for id in 1..=20 {
            insert_note(db, id)?;
        }
        db.insert("tags", [("tag", "rust")])?;
        (db.select_all("notes")?, db.page_count())
    };

    let db = temp_db.reopen()?;
    assert_eq!(db.list_tables(), vec!["notes", "tags"]);
    assert_eq!(db.get_row_count("notes")?, 20);
    assert_eq!(db.get_row_count("tags")?, 1);
    assert_eq!(db.select_all("notes")?, before_rows);
    assert_eq!(db.page_count(), before_pages);
    assert_eq!(
        db.select_by_id("notes", 5)?.get("score"),
        None,
        "null survives reopen"
    );
    Ok(())
}

#[test]
fn test_ids_continue_after_reopen() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("persist_ids")?;
    {
        let db = temp_db.create_database()?;
        create_notes(db)?;
        insert_note(db, 1)?;
        insert_note(db, 2)?;
    }

    let db = temp_db.reopen()?;
    assert_eq!(insert_note(db, 3)?, 3);
    db.create_table(
        "later",
        vec![ColumnSchema::new("x", DataType::Integer)],
        "x",
    )?;
    assert_eq!(db.get_table_schema("later")?.table_id, 2);

    let db = temp_db.reopen()?;
    assert_eq!(db.get_row_count("notes")?, 3);
    assert_eq!(db.get_table_schema("later")?.table_id, 2);
    Ok(())
}

#[test]
fn test_page_overflow_allocates_linked_pages() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("persist_overflow")?.with_page_size(256);
    let (first_page, last_page) = {
        let db = temp_db.create_database()?;
        create_notes(db)?;
        let initial = db.get_table_schema("notes")?;
        assert_eq!(initial.first_page_id, initial.last_page_id);

        for id in 1..=60 {
            insert_note(db, id)?;
        }

        let grown = db.get_table_schema("notes")?;
        assert_eq!(grown.first_page_id, initial.first_page_id);
        assert!(grown.last_page_id > initial.last_page_id);
        (grown.first_page_id, grown.last_page_id)
    };

    let db = temp_db.reopen()?;
    let recovered = db.get_table_schema("notes")?;
    assert_eq!(recovered.first_page_id, first_page);
    assert_eq!(recovered.last_page_id, last_page);

    let rows = db.select_all("notes")?;
    assert_eq!(rows.len(), 60);
    let ids: Vec<i64> = rows
        .iter()
        .filter_map(|r| match r.get("id") {
            Some(Value::Integer(id)) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, (1..=60).collect::<Vec<_>>());

    // new rows keep filling the recovered tail
    insert_note(db, 61)?;
    assert_eq!(db.select_by_id("notes", 61)?.get("id"), Some(&Value::Integer(61)));
    Ok(())
}

#[test]
fn test_row_too_large_for_page() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("persist_too_large")?.with_page_size(128);
    let db = temp_db.create_database()?;
    create_notes(db)?;
    let pages = db.page_count();

    let result = db.insert(
        "notes",
        [("id", Value::from(1)), ("body", Value::from("x".repeat(200)))],
    );
    assert!(matches!(result, Err(DatabaseError::SerializationError { .. })));
    assert_eq!(db.page_count(), pages);
    assert_eq!(db.get_row_count("notes")?, 0);
    Ok(())
}

#[test]
fn test_invalid_page_size_rejected() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("persist_page_size")?;

    for size in [0, 16, 63, 65536] {
        match Database::open(&temp_db.path, size) {
            Err(DatabaseError::InvalidPageSize { size: got, .. }) => assert_eq!(got, size),
            Err(other) => panic!("Expected InvalidPageSize, got {:?}", other),
            Ok(_) => panic!("page size {} should be rejected", size),
        }
    }
    assert!(!temp_db.path.exists());
    Ok(())
}

#[test]
fn test_corrupt_file_fails_open() -> Result<(), DatabaseError> {
    let temp_db = TempDatabase::with_prefix("persist_corrupt")?.with_page_size(64);
    // a data page (type 2) owned by table 9, which has no table page
    let mut page = vec![0u8; 64];
    page[0] = 2;
    page[1] = 9;
    page[15] = 17;
    fs::write(&temp_db.path, &page)?;

    let config = DatabaseConfig::new(&temp_db.path, 64);
    assert!(matches!(
        Database::open_with_config(config),
        Err(DatabaseError::CorruptData { page_id: 0, .. })
    ));
    Ok(())
}

#[test]
fn test_empty_primary_key_survives_reopen() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("persist_no_pk")?;
    let db = temp_db.create_database()?;
    db.create_table(
        "events",
        vec![ColumnSchema::new("kind", DataType::Text)],
        "",
    )?;
    db.insert("events", [("kind", "boot")])?;

    let db = temp_db.reopen()?;
    assert_eq!(db.get_table_schema("events")?.primary_key, "");
    assert_eq!(db.get_row_count("events")?, 1);
    Ok(())
}
