use lembar::{
    ColumnSchema, DataType, Database, DatabaseError, Value, utils::mock::TempDatabase,
};

fn create_users(db: &Database) -> Result<(), DatabaseError> {
    db.create_table(
        "users",
        vec![
            ColumnSchema::new("id", DataType::Integer).not_null(),
            ColumnSchema::new("name", DataType::Text).not_null(),
            ColumnSchema::new("age", DataType::Integer),
            ColumnSchema::new("is_active", DataType::Boolean).not_null(),
            ColumnSchema::new("salary", DataType::Real),
        ],
        "id",
    )
}

fn insert_users(db: &Database) -> Result<(), DatabaseError> {
    db.insert(
        "users",
        [
            ("id", Value::from(1)),
            ("name", Value::from("John Doe")),
            ("age", Value::from(30)),
            ("is_active", Value::from(true)),
            ("salary", Value::from(75000.50)),
        ],
    )?;
    db.insert(
        "users",
        [
            ("id", Value::from(2)),
            ("name", Value::from("Jane Smith")),
            ("age", Value::from(25)),
            ("is_active", Value::from(true)),
            ("salary", Value::from(65000.0)),
        ],
    )?;
    db.insert(
        "users",
        [
            ("id", Value::from(3)),
            ("name", Value::from("Bob Johnson")),
            ("age", Value::from(35)),
            ("is_active", Value::from(false)),
            ("salary", Value::Null),
        ],
    )?;
    Ok(())
}

fn names(rows: &[lembar::Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[test]
fn test_select_all_and_by_id() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("scenario_a")?;
    let db = temp_db.create_database()?;
    create_users(db)?;
    insert_users(db)?;

    let rows = db.select_all("users")?;
    assert_eq!(rows.len(), 3);
    assert_eq!(names(&rows), vec!["John Doe", "Jane Smith", "Bob Johnson"]);
    assert_eq!(rows[2].get("salary"), None);

    let second = db.select_by_id("users", 2)?;
    assert_eq!(second.row_id, 2);
    assert_eq!(second.get("name"), Some(&Value::Text("Jane Smith".into())));
    assert_eq!(second.get("salary"), Some(&Value::Real(65000.0)));

    let oldest = db.select_where("users", "age", ">", 30)?;
    assert_eq!(names(&oldest), vec!["Bob Johnson"]);
    Ok(())
}

#[test]
fn test_null_salary_never_matches() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("scenario_b")?;
    let db = temp_db.create_database()?;
    create_users(db)?;
    insert_users(db)?;

    let well_paid = db.select_where("users", "salary", ">=", 70000.0)?;
    assert_eq!(names(&well_paid), vec!["John Doe"]);

    let not_equal = db.select_where("users", "salary", "!=", 1.0)?;
    assert_eq!(names(&not_equal), vec!["John Doe", "Jane Smith"]);
    Ok(())
}

#[test]
fn test_rejected_inserts_do_not_change_count() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("scenario_c")?;
    let db = temp_db.create_database()?;
    create_users(db)?;
    insert_users(db)?;

    let missing = db.insert(
        "users",
        [("id", Value::from(4)), ("name", Value::from("No Flag"))],
    );
    match missing {
        Err(DatabaseError::MissingRequiredColumn { name, .. }) => assert_eq!(name, "is_active"),
        other => panic!("Expected MissingRequiredColumn, got {:?}", other),
    }

    let wrong_type = db.insert(
        "users",
        [
            ("id", Value::from(4)),
            ("name", Value::from("Typo")),
            ("is_active", Value::from("yes")),
        ],
    );
    assert!(matches!(wrong_type, Err(DatabaseError::TypeMismatch { .. })));

    let unknown = db.insert(
        "users",
        [
            ("id", Value::from(4)),
            ("name", Value::from("Extra")),
            ("is_active", Value::from(true)),
            ("email", Value::from("x@example.com")),
        ],
    );
    assert!(matches!(unknown, Err(DatabaseError::UnknownColumn { .. })));

    assert_eq!(db.get_row_count("users")?, 3);
    assert_eq!(db.select_all("users")?.len(), 3);
    Ok(())
}

#[test]
fn test_like_substring() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("scenario_d")?;
    let db = temp_db.create_database()?;
    create_users(db)?;
    insert_users(db)?;

    let rows = db.select_where("users", "name", "LIKE", "%oh%")?;
    assert_eq!(names(&rows), vec!["John Doe", "Bob Johnson"]);

    let prefix = db.select_where("users", "name", "LIKE", "Ja%")?;
    assert_eq!(names(&prefix), vec!["Jane Smith"]);

    let suffix = db.select_where("users", "name", "LIKE", "%son")?;
    assert_eq!(names(&suffix), vec!["Bob Johnson"]);
    Ok(())
}

#[test]
fn test_monotonic_row_ids() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("monotonic_ids")?;
    let db = temp_db.create_database()?;
    db.create_table(
        "events",
        vec![ColumnSchema::new("seq", DataType::Integer).not_null()],
        "seq",
    )?;

    for expected in 1..=25u64 {
        let row_id = db.insert("events", [("seq", expected * 10)])?;
        assert_eq!(row_id, expected);
    }
    assert_eq!(db.get_row_count("events")?, 25);

    let rows = db.select_all("events")?;
    let row_ids: Vec<u64> = rows.iter().map(|r| r.row_id).collect();
    assert_eq!(row_ids, (1..=25).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_duplicate_table() -> Result<(), DatabaseError> {
    let mut temp_db = TempDatabase::with_prefix("duplicate_table")?;
    let db = temp_db.create_database()?;
    create_users(db)?;
    insert_users(db)?;
    let pages_before = db.page_count();

    match create_users(db) {
        Err(DatabaseError::TableAlreadyExists { name }) => assert_eq!(name, "users"),
        other => panic!("Expected TableAlreadyExists, got {:?}", other),
    }

    assert_eq!(db.page_count(), pages_before);
    assert_eq!(db.list_tables(), vec!["users"]);
    assert_eq!(db.get_row_count("users")?, 3);
    Ok(())
}
