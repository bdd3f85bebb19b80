use std::{collections::HashMap, io::Write, path::PathBuf};

use clap::Parser;
use lembar::{
    ColumnSchema, DataType, Database, DatabaseConfig, DatabaseError, Row, TableSchema, Value,
    art::welcome_message,
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::{EnvFilter, fmt};

const HISTORY_FILE: &str = ".lembar_history";

/// Interactive shell over a lembar database file
#[derive(Parser, Debug)]
#[command(name = "lembar")]
#[command(version)]
struct Args {
    /// Database file, created when missing
    #[arg(short, long, default_value = "lembar.db")]
    path: PathBuf,

    /// Page size in bytes; must match the size the file was created with
    #[arg(short = 's', long, default_value = "4096")]
    page_size: usize,

    /// fsync after every page write
    #[arg(long)]
    sync: bool,
}

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "lembar> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // trailing backslash continues the command on the next line
        match trimmed_line.strip_suffix('\\') {
            Some(partial) => {
                input.push_str(partial);
                input.push(' ');
                prompt = "     -> ".to_string();
            }
            None => {
                input.push_str(trimmed_line);
                break;
            }
        }
    }

    Ok(input)
}

/// Split on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_value(raw: &str, data_type: DataType) -> Result<Value, String> {
    if raw.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    match data_type {
        DataType::Integer => unquoted
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| format!("'{}' is not an integer: {}", raw, e)),
        DataType::Real => unquoted
            .parse::<f64>()
            .map(Value::Real)
            .map_err(|e| format!("'{}' is not a number: {}", raw, e)),
        DataType::Boolean => match unquoted.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Ok(Value::Boolean(true)),
            "false" | "f" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("'{}' is not a boolean", raw)),
        },
        DataType::Text => Ok(Value::Text(unquoted.to_string())),
    }
}

fn print_schema(schema: &TableSchema) {
    println!("table {} (id {})", schema.table_name, schema.table_id);
    for column in &schema.columns {
        let mut flags = Vec::new();
        if column.not_null {
            flags.push("NOT NULL");
        }
        if column.name == schema.primary_key {
            flags.push("PRIMARY KEY");
        }
        println!("  {} {} {}", column.name, column.data_type, flags.join(" "));
    }
    println!(
        "  pages: first={:?} last={:?}",
        schema.first_page_id, schema.last_page_id
    );
}

fn print_rows(schema: &TableSchema, rows: &[Row]) {
    let mut header = vec!["row_id".to_string()];
    header.extend(schema.column_names());
    println!("{}", header.join(" | "));

    for row in rows {
        let mut cells = vec![row.row_id.to_string()];
        cells.extend(schema.columns.iter().map(|c| row.value(&c.name).to_string()));
        println!("{}", cells.join(" | "));
    }
    println!("({} rows)", rows.len());
}

fn create_table(db: &Database, args: &[String]) -> Result<(), String> {
    let (table, defs) = args
        .split_first()
        .ok_or("usage: create <table> <col>:<type>[!] ... [pk=<col>]")?;

    let mut columns = Vec::new();
    let mut primary_key = None;
    for def in defs {
        if let Some(pk) = def.strip_prefix("pk=") {
            primary_key = Some(pk.to_string());
            continue;
        }
        let (name, ty) = def
            .split_once(':')
            .ok_or_else(|| format!("column '{}' needs the form name:type", def))?;
        let (ty, not_null) = match ty.strip_suffix('!') {
            Some(ty) => (ty, true),
            None => (ty, false),
        };
        let data_type = DataType::from_string(ty).map_err(|e| e.to_string())?;
        let column = ColumnSchema::new(name, data_type);
        columns.push(if not_null { column.not_null() } else { column });
    }

    let primary_key = match primary_key {
        Some(pk) => pk,
        None => columns
            .first()
            .map(|c| c.name.clone())
            .ok_or("a table needs at least one column")?,
    };

    db.create_table(table, columns, &primary_key)
        .map_err(|e| e.to_string())?;
    println!("created table {}", table);
    Ok(())
}

fn insert_row(db: &Database, args: &[String]) -> Result<(), String> {
    let (table, assignments) = args
        .split_first()
        .ok_or("usage: insert <table> <col>=<value> ...")?;
    let schema = db.get_table_schema(table).map_err(|e| e.to_string())?;

    let mut values = HashMap::new();
    for assignment in assignments {
        let (name, raw) = assignment
            .split_once('=')
            .ok_or_else(|| format!("'{}' needs the form column=value", assignment))?;
        let value = match schema.get_column(name) {
            Some(column) => parse_value(raw, column.data_type)?,
            // let the database report the unknown column
            None => Value::Text(raw.to_string()),
        };
        values.insert(name.to_string(), value);
    }

    let row_id = db.insert(table, values).map_err(|e| e.to_string())?;
    println!("inserted row {}", row_id);
    Ok(())
}

fn select_where(db: &Database, args: &[String]) -> Result<(), String> {
    let [table, column, op, raw] = args else {
        return Err("usage: where <table> <column> <op> <value>".to_string());
    };
    let schema = db.get_table_schema(table).map_err(|e| e.to_string())?;
    let data_type = schema
        .get_column(column)
        .map(|c| c.data_type)
        .ok_or_else(|| {
            DatabaseError::ColumnNotFound {
                name: column.clone(),
                table: table.clone(),
            }
            .to_string()
        })?;

    // LIKE patterns are text whatever the column type
    let value = if op == "LIKE" {
        parse_value(raw, DataType::Text)?
    } else {
        parse_value(raw, data_type)?
    };

    let rows = db
        .select_where(table, column, op, value)
        .map_err(|e| e.to_string())?;
    print_rows(&schema, &rows);
    Ok(())
}

fn run_command(db: &Database, tokens: &[String]) -> Result<(), String> {
    let Some((command, args)) = tokens.split_first() else {
        return Ok(());
    };

    match (command.to_lowercase().as_str(), args) {
        ("tables", _) => {
            for name in db.list_tables() {
                println!("{}", name);
            }
        }
        ("schema", [table]) => {
            let schema = db.get_table_schema(table).map_err(|e| e.to_string())?;
            print_schema(&schema);
        }
        ("count", [table]) => {
            let count = db.get_row_count(table).map_err(|e| e.to_string())?;
            println!("{}", count);
        }
        ("create", args) => create_table(db, args)?,
        ("insert", args) => insert_row(db, args)?,
        ("scan", [table]) => {
            let schema = db.get_table_schema(table).map_err(|e| e.to_string())?;
            let rows = db.select_all(table).map_err(|e| e.to_string())?;
            print_rows(&schema, &rows);
        }
        ("get", [table, id]) => {
            let schema = db.get_table_schema(table).map_err(|e| e.to_string())?;
            let row_id = id
                .parse()
                .map_err(|e| format!("'{}' is not a row id: {}", id, e))?;
            let row = db.select_by_id(table, row_id).map_err(|e| e.to_string())?;
            print_rows(&schema, &[row]);
        }
        ("where", args) => select_where(db, args)?,
        (other, _) => {
            return Err(format!(
                "unknown command or wrong arguments: '{}' (try 'help')",
                other
            ));
        }
    }
    Ok(())
}

fn process_command(db: &Database, command: &str) -> bool {
    let cmd = command.trim();

    match cmd.to_lowercase().as_str() {
        "exit" | "quit" | "q" => {
            println!("Goodbye!");
            return false;
        }
        "help" | "h" => {
            println!(
                r#"
Available commands:
  tables                                   - List tables
  schema <table>                           - Show a table's columns
  count <table>                            - Number of rows in a table
  create <table> <col>:<type>[!] ... [pk=<col>]
                                           - Create a table; '!' marks NOT NULL,
                                             types: integer, text, real, boolean
  insert <table> <col>=<value> ...         - Insert a row; quote text with spaces
  scan <table>                             - Show every row
  get <table> <row_id>                     - Show one row
  where <table> <col> <op> <value>         - Filter rows (=, !=, <, <=, >, >=, LIKE)
  help, h                                  - Show this help message
  clear                                    - Clear the screen
  exit, quit, q                            - Exit the database

Use '\' at the end of a line for multiline input.
Use Up/Down arrows to navigate command history.
"#
            );
        }
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        _ => {
            if let Err(message) = run_command(db, &tokenize(cmd)) {
                println!("Error: {}", message);
            }
        }
    }

    true
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,lembar=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = DatabaseConfig::builder()
        .path(&args.path)
        .page_size(args.page_size)
        .sync_writes(args.sync)
        .build();

    let db = match Database::open_with_config(config) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", welcome_message("LEMBAR DB"));

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            tracing::error!("Failed to start line editor: {}", e);
            std::process::exit(1);
        }
    };
    if rl.load_history(HISTORY_FILE).is_err() {
        tracing::debug!("no history file at {}", HISTORY_FILE);
    }

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();

                if !command.is_empty() {
                    let _ = rl.add_history_entry(&command);
                    if !process_command(&db, &command) {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(HISTORY_FILE) {
        tracing::warn!("Failed to save history: {}", e);
    }
    if let Err(e) = db.close() {
        tracing::error!("Failed to close database: {}", e);
        std::process::exit(1);
    }
}
