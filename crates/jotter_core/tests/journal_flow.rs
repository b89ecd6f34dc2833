use chrono::{DateTime, TimeZone, Utc};
use jotter_core::{Database, FieldValue, JournalService};

#[test]
fn add_entry_splits_persists_and_reads_back() {
    let mut db = Database::in_memory();
    let conn = db.connection().unwrap();
    let journal = JournalService::new(conn);
    journal.init().unwrap();

    let happened = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let saved = journal
        .add_entry(Some("ada"), Some(happened), "Lab day\nWrote the first program.\n")
        .unwrap();
    assert_eq!(saved.rowid(), Some(1));

    let entries = journal.entries().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(
        entry.get("title"),
        Some(&FieldValue::Text("Lab day".to_string()))
    );
    assert_eq!(
        entry.get("body"),
        Some(&FieldValue::Text("Wrote the first program.".to_string()))
    );
    assert_eq!(
        entry.get("author"),
        Some(&FieldValue::Text("ada".to_string()))
    );
    assert_eq!(entry.get("happened_at"), Some(&FieldValue::DateTime(happened)));
    assert!(matches!(
        entry.get("created_at"),
        Some(FieldValue::DateTime(_))
    ));
}

#[test]
fn omitted_author_and_happened_at_stay_null() {
    let mut db = Database::in_memory();
    let conn = db.connection().unwrap();
    let journal = JournalService::new(conn);
    journal.init().unwrap();

    journal.add_entry(None, None, "quick note").unwrap();

    let entries = journal.entries().unwrap();
    assert_eq!(entries[0].get("author"), Some(&FieldValue::Null));
    assert_eq!(entries[0].get("happened_at"), Some(&FieldValue::Null));
}

#[test]
fn stored_timestamps_parse_via_sqlite_chrono_types() {
    let mut db = Database::in_memory();
    let conn = db.connection().unwrap();
    let journal = JournalService::new(conn);
    journal.init().unwrap();
    journal.add_entry(Some("ada"), None, "timestamped").unwrap();

    // The created_at column is stored as RFC 3339 text, so it must also be
    // readable through rusqlite's own chrono conversions.
    let created_at: DateTime<Utc> = conn
        .query_row("SELECT created_at FROM journal;", [], |row| row.get(0))
        .unwrap();
    assert!(created_at <= Utc::now());
}

#[test]
fn entries_persist_across_database_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    {
        let mut db = Database::open(&path);
        let conn = db.connection().unwrap();
        let journal = JournalService::new(conn);
        journal.init().unwrap();
        journal.add_entry(Some("ada"), None, "durable entry").unwrap();
    }

    let mut db = Database::open(&path);
    let conn = db.connection().unwrap();
    let journal = JournalService::new(conn);
    journal.init().unwrap();

    let entries = journal.entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].get("title"),
        Some(&FieldValue::Text("durable entry".to_string()))
    );
}

#[test]
fn full_text_search_reaches_saved_entries() {
    let mut db = Database::in_memory();
    let conn = db.connection().unwrap();
    let journal = JournalService::new(conn);
    journal.init().unwrap();
    journal
        .add_entry(Some("ada"), None, "Engines\nNotes about the analytical engine.")
        .unwrap();
    journal.add_entry(Some("ada"), None, "Lunch\nSoup.").unwrap();

    // The journal table is an FTS4 virtual table, so MATCH works out of
    // the box over its text columns.
    let hits: i64 = conn
        .query_row(
            "SELECT count(*) FROM journal WHERE journal MATCH 'analytical';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(hits, 1);
}
