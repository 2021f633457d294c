pub mod migrations;
pub mod queries;

use std::time::Duration;

use anyhow::Context;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    // journal_mode reports the resulting mode as a row; in-memory databases stay "memory".
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
        .context("failed to set journal mode")?;
    tracing::debug!(journal_mode = %journal_mode, "database opened");

    // Writers on other connections wait for the lock instead of failing with SQLITE_BUSY.
    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;

    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("failed to enable foreign keys")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
