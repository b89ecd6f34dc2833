//! SQLite connection handle with lazy open and stale-connection recovery.
//!
//! # Responsibility
//! - Own the single connection used by record stores.
//! - Probe cached connections and reopen once when the probe fails.
//!
//! # Invariants
//! - The storage target is captured at construction; later configuration
//!   changes are not observed.
//! - No internal synchronization: callers serialize access externally.

use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory,
}

/// Explicit connection handle, constructed once by assembly code and passed
/// by reference to everything that executes statements.
///
/// The connection opens lazily on first use. Each later access probes the
/// cached connection with a no-op statement; a failed probe discards the
/// cache and reopens exactly once.
pub struct Database {
    target: Target,
    conn: Option<Connection>,
    // Swappable in tests to force the stale-connection path.
    probe: fn(&Connection) -> bool,
}

impl Database {
    /// Handle backed by a database file. No I/O happens until first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::File(path.into()),
            conn: None,
            probe,
        }
    }

    /// Handle backed by an in-memory database, for tests and smoke runs.
    pub fn in_memory() -> Self {
        Self {
            target: Target::Memory,
            conn: None,
            probe,
        }
    }

    /// Returns a live connection, opening or reopening as needed.
    pub fn connection(&mut self) -> DbResult<&Connection> {
        let conn = match self.conn.take() {
            Some(cached) if (self.probe)(&cached) => cached,
            Some(_stale) => {
                warn!("event=db_probe module=db status=stale action=reopen");
                self.open_target()?
            }
            None => self.open_target()?,
        };
        Ok(self.conn.insert(conn))
    }

    fn open_target(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        let (mode, opened) = match &self.target {
            Target::File(path) => ("file", Connection::open(path)),
            Target::Memory => ("memory", Connection::open_in_memory()),
        };
        match opened {
            Ok(conn) => {
                info!(
                    "event=db_open module=db status=ok mode={} duration_ms={}",
                    mode,
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={} duration_ms={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn probe(conn: &Connection) -> bool {
    conn.execute_batch("SELECT 1;").is_ok()
}
