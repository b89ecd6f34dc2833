//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `jotter_core` wiring.
//! - Keep output deterministic for quick local sanity checks.

use jotter_core::{
    default_log_level, init_logging, Database, FieldValue, JotterConfig, JournalService,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("jotter: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(default_log_level(), "logs")?;

    let config = JotterConfig::load(None)?;
    let mut db = Database::open(config.db_path());
    let conn = db.connection()?;

    let journal = JournalService::new(conn);
    journal.init()?;

    let entries = journal.entries()?;
    println!("jotter_core version={}", jotter_core::core_version());
    println!("entries={}", entries.len());
    for entry in &entries {
        let title = match entry.get("title") {
            Some(FieldValue::Text(title)) => title.as_str(),
            _ => "(untitled)",
        };
        println!("{} {}", entry.rowid().unwrap_or_default(), title);
    }
    Ok(())
}
