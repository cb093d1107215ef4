//! Unit tests for the Handymarks database layer.
//!
//! Covers schema creation, migration versioning, and that reopening an
//! existing database is safe.

use handymarks::database::{migrations, Database};

fn table_names(db: &Database) -> Vec<String> {
    db.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(Result::ok).collect())
    })
    .expect("failed to list tables")
}

#[test]
fn open_in_memory_creates_schema() {
    let db = Database::open_in_memory().expect("failed to open in-memory database");
    let tables = table_names(&db);

    assert!(tables.contains(&"bookmarks".to_string()));
    assert!(tables.contains(&"folders".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));
}

#[test]
fn schema_version_is_recorded() {
    let db = Database::open_in_memory().expect("failed to open in-memory database");
    let version = db
        .with_connection(|conn| Ok(migrations::get_schema_version(conn)))
        .unwrap();
    assert_eq!(version, migrations::CURRENT_SCHEMA_VERSION);
}

#[test]
fn bookmark_indexes_exist() {
    let db = Database::open_in_memory().expect("failed to open in-memory database");
    let indexes: Vec<String> = db
        .with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            Ok(rows.filter_map(Result::ok).collect())
        })
        .unwrap();

    assert!(indexes.contains(&"idx_bookmarks_folder".to_string()));
    assert!(indexes.contains(&"idx_bookmarks_created".to_string()));
    assert!(indexes.contains(&"idx_bookmarks_last_accessed".to_string()));
}

#[test]
fn folder_names_are_unique_case_insensitively() {
    let db = Database::open_in_memory().expect("failed to open in-memory database");
    let result = db.with_connection(|conn| {
        conn.execute(
            "INSERT INTO folders (id, name, date_created) VALUES ('a', 'Work', 0)",
            [],
        )?;
        Ok(conn.execute(
            "INSERT INTO folders (id, name, date_created) VALUES ('b', 'work', 0)",
            [],
        ))
    });

    // The second insert violates the COLLATE NOCASE unique constraint
    assert!(result.unwrap().is_err());
}

#[test]
fn reopening_a_database_is_idempotent() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("handymarks.db");

    {
        let db = Database::open(&path).expect("first open failed");
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO bookmarks (id, title, url, created, last_updated, last_accessed) \
                 VALUES ('b1', 'Example', 'https://example.com', 1, 1, 1)",
                [],
            )?;
            Ok(())
        })
        .unwrap();
    }

    let db = Database::open(&path).expect("second open failed");
    let count: i64 = db
        .with_connection(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))?)
        })
        .unwrap();
    assert_eq!(count, 1);

    let version = db
        .with_connection(|conn| Ok(migrations::get_schema_version(conn)))
        .unwrap();
    assert_eq!(version, migrations::CURRENT_SCHEMA_VERSION);
}

#[test]
fn wal_mode_is_enabled_on_file_databases() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("handymarks.db");
    let db = Database::open(&path).expect("failed to open database");

    let mode: String = db
        .with_connection(|conn| {
            Ok(conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?)
        })
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
