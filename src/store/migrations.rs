//! Schema versioning for the account store.
//!
//! Each step runs once, inside its own transaction, and is recorded in
//! `schema_version`. Databases created before versioning existed have no
//! `schema_version` table; they run every step, and each step inspects the
//! live schema instead of relying on DDL failures.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::Result;

/// Highest schema version this build knows about.
pub const SCHEMA_VERSION: i64 = 4;

const ACCOUNTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        name TEXT,
        profile_image TEXT,
        total_media INTEGER DEFAULT 0,
        last_fetched DATETIME,
        response_json TEXT
    )";

const UNIQUE_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_username_media_type ON accounts(username, media_type)";

/// Bring the schema up to [`SCHEMA_VERSION`].
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let current = current_version(conn)?;

    if current < 1 {
        apply(conn, 1, migrate_v1)?;
    }
    if current < 2 {
        apply(conn, 2, migrate_v2)?;
    }
    if current < 3 {
        apply(conn, 3, migrate_v3)?;
    }
    if current < 4 {
        apply(conn, 4, migrate_v4)?;
    }

    // Recreated on every open so a dropped index cannot break upserts.
    conn.execute(UNIQUE_INDEX, [])?;

    Ok(())
}

/// Latest applied version, 0 for a fresh or pre-versioning database.
pub fn current_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

fn apply(conn: &mut Connection, version: i64, step: fn(&Transaction<'_>) -> Result<()>) -> Result<()> {
    tracing::info!("Applying account store migration v{}", version);

    let tx = conn.transaction()?;
    step(&tx)?;
    tx.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![version, Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// v1: base accounts table.
fn migrate_v1(tx: &Transaction<'_>) -> Result<()> {
    tx.execute(ACCOUNTS_TABLE, [])?;
    Ok(())
}

/// v2: group columns.
fn migrate_v2(tx: &Transaction<'_>) -> Result<()> {
    add_column_if_missing(tx, "group_name", "TEXT DEFAULT ''")?;
    add_column_if_missing(tx, "group_color", "TEXT DEFAULT ''")?;
    Ok(())
}

/// v3: per-filter records and resume state.
fn migrate_v3(tx: &Transaction<'_>) -> Result<()> {
    add_column_if_missing(tx, "media_type", "TEXT DEFAULT 'all'")?;
    add_column_if_missing(tx, "cursor", "TEXT DEFAULT ''")?;
    add_column_if_missing(tx, "completed", "INTEGER DEFAULT 1")?;
    Ok(())
}

/// v4: drop a single-column UNIQUE(username) left over from one-row-per-handle
/// installations, so the same handle can hold one row per filter.
fn migrate_v4(tx: &Transaction<'_>) -> Result<()> {
    if !has_unique_username_only(tx)? {
        return Ok(());
    }

    tracing::info!("Rebuilding accounts table without UNIQUE(username)");

    tx.execute_batch(
        "CREATE TABLE accounts_rebuilt (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            name TEXT,
            profile_image TEXT,
            total_media INTEGER DEFAULT 0,
            last_fetched DATETIME,
            response_json TEXT,
            group_name TEXT DEFAULT '',
            group_color TEXT DEFAULT '',
            media_type TEXT DEFAULT 'all',
            cursor TEXT DEFAULT '',
            completed INTEGER DEFAULT 1
        );
        INSERT INTO accounts_rebuilt
            (id, username, name, profile_image, total_media, last_fetched, response_json,
             group_name, group_color, media_type, cursor, completed)
        SELECT id, username, name, profile_image, total_media, last_fetched, response_json,
               group_name, group_color, media_type, cursor, completed
        FROM accounts;
        DROP TABLE accounts;
        ALTER TABLE accounts_rebuilt RENAME TO accounts;",
    )?;
    Ok(())
}

fn add_column_if_missing(tx: &Transaction<'_>, column: &str, definition: &str) -> Result<()> {
    if column_exists(tx, "accounts", column)? {
        return Ok(());
    }
    tx.execute(
        &format!("ALTER TABLE accounts ADD COLUMN {} {}", column, definition),
        [],
    )?;
    Ok(())
}

/// Whether `table` has a column named `column`.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn has_unique_username_only(conn: &Connection) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA index_list(accounts)")?;
    let unique_indexes: Vec<String> = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(2)?)))?
        .filter_map(|r| r.ok())
        .filter(|(_, unique)| *unique)
        .map(|(name, _)| name)
        .collect();

    for index in unique_indexes {
        let mut info = conn.prepare(&format!("PRAGMA index_info('{}')", index.replace('\'', "''")))?;
        let columns: Vec<String> = info
            .query_map([], |row| row.get::<_, String>(2))?
            .collect::<std::result::Result<_, _>>()?;
        if columns == ["username"] {
            return Ok(true);
        }
    }
    Ok(false)
}
