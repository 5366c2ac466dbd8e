//! Account records: upsert, listing and direct CRUD.

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::migrations::run_migrations;
use crate::store::payload::{account_counts, normalize_payload};

/// Filter used when the caller does not name one.
pub const DEFAULT_FILTER: &str = "all";

/// Stored timestamp layout, sortable as text.
const STORED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// Fields written by [`AccountStore::upsert`].
#[derive(Debug, Clone)]
pub struct SaveAccount {
    pub handle: String,
    pub display_name: String,
    pub profile_image: String,
    pub total_media: i64,
    pub payload: String,
    pub filter: String,
    pub cursor: String,
    pub completed: bool,
}

impl SaveAccount {
    /// A completed fetch for `handle` under the default filter.
    pub fn new(handle: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: String::new(),
            profile_image: String::new(),
            total_media: 0,
            payload: payload.into(),
            filter: DEFAULT_FILTER.to_string(),
            cursor: String::new(),
            completed: true,
        }
    }
}

/// A full stored account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountRecord {
    pub id: i64,
    pub handle: String,
    pub display_name: String,
    pub profile_image: String,
    pub total_media: i64,
    pub last_fetched: String,
    /// Always in the current payload shape when read through the store.
    pub payload: String,
    pub filter: String,
    pub cursor: String,
    pub completed: bool,
    pub group_name: String,
    pub group_color: String,
}

/// Listing row with counts derived from the payload.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub id: i64,
    pub handle: String,
    pub display_name: String,
    pub profile_image: String,
    pub total_media: i64,
    /// `YYYY-MM-DD HH:MM` in local time, empty if never recorded.
    pub last_fetched: String,
    pub group_name: String,
    pub group_color: String,
    pub filter: String,
    pub cursor: String,
    pub completed: bool,
    pub followers_count: i64,
    pub statuses_count: i64,
}

/// A distinct user-assigned group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub color: String,
}

/// Persistent store of fetched accounts.
///
/// Owns its SQLite connection: open once with [`AccountStore::open`] (or
/// [`AccountStore::open_in_memory`]), close with [`AccountStore::close`] or by
/// dropping it. SQLite serializes concurrent access; there are no
/// cross-call transactions.
pub struct AccountStore {
    conn: Connection,
}

impl AccountStore {
    /// Open (creating if needed) the database at `path` and migrate it.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::fs::ensure_dir(parent)?;
        }
        tracing::debug!("Opening account store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an isolated in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    /// Insert or update the record keyed on `(handle, filter)`.
    ///
    /// The last-fetch timestamp is always refreshed. Returns the row id.
    pub fn upsert(&self, account: &SaveAccount) -> Result<i64> {
        let handle = account.handle.trim();
        if handle.is_empty() {
            return Err(Error::InvalidInput("handle must not be empty".into()));
        }
        let filter = match account.filter.trim() {
            "" => DEFAULT_FILTER,
            f => f,
        };
        let now = Utc::now().format(STORED_TIME_FORMAT).to_string();

        let id = self.conn.query_row(
            "INSERT INTO accounts
                (username, name, profile_image, total_media, last_fetched, response_json,
                 media_type, cursor, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(username, media_type) DO UPDATE SET
                name = excluded.name,
                profile_image = excluded.profile_image,
                total_media = excluded.total_media,
                last_fetched = excluded.last_fetched,
                response_json = excluded.response_json,
                cursor = excluded.cursor,
                completed = excluded.completed
             RETURNING id",
            params![
                handle,
                account.display_name,
                account.profile_image,
                account.total_media,
                now,
                account.payload,
                filter,
                account.cursor,
                account.completed,
            ],
            |row| row.get(0),
        )?;

        tracing::info!(
            "Saved account {} [{}] (cursor: {}, completed: {})",
            handle,
            filter,
            if account.cursor.is_empty() { "none" } else { "set" },
            account.completed
        );
        Ok(id)
    }

    /// All accounts, ordered by group name then most recent fetch.
    pub fn list_all(&self) -> Result<Vec<AccountSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, COALESCE(name, ''), COALESCE(profile_image, ''),
                    COALESCE(total_media, 0), last_fetched,
                    COALESCE(group_name, ''), COALESCE(group_color, ''),
                    COALESCE(media_type, 'all'), COALESCE(cursor, ''),
                    COALESCE(completed, 1), COALESCE(response_json, '')
             FROM accounts
             ORDER BY group_name ASC, last_fetched DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            let payload: String = row.get(11)?;
            let (followers_count, statuses_count) = account_counts(&payload);
            Ok(AccountSummary {
                id: row.get(0)?,
                handle: row.get(1)?,
                display_name: row.get(2)?,
                profile_image: row.get(3)?,
                total_media: row.get(4)?,
                last_fetched: display_time(row.get::<_, Option<String>>(5)?.as_deref()),
                group_name: row.get(6)?,
                group_color: row.get(7)?,
                filter: row.get(8)?,
                cursor: row.get(9)?,
                completed: row.get(10)?,
                followers_count,
                statuses_count,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            match row {
                Ok(account) => accounts.push(account),
                Err(e) => tracing::warn!("Skipping unreadable account row: {}", e),
            }
        }
        Ok(accounts)
    }

    /// Fetch one account; its payload is normalized to the current shape.
    pub fn get_by_id(&self, id: i64) -> Result<AccountRecord> {
        let mut record = self
            .conn
            .query_row(
                "SELECT id, username, COALESCE(name, ''), COALESCE(profile_image, ''),
                        COALESCE(total_media, 0), last_fetched, COALESCE(response_json, ''),
                        COALESCE(media_type, 'all'), COALESCE(cursor, ''),
                        COALESCE(completed, 1), COALESCE(group_name, ''),
                        COALESCE(group_color, '')
                 FROM accounts WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?
            .ok_or(Error::AccountNotFound(id))?;

        match normalize_payload(&record.payload) {
            Ok(normalized) => record.payload = normalized,
            Err(e) => tracing::debug!("Account {} payload left as stored: {}", id, e),
        }

        Ok(record)
    }

    /// Delete one account.
    pub fn delete_by_id(&self, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Error::AccountNotFound(id));
        }
        tracing::info!("Deleted account {}", id);
        Ok(())
    }

    /// Delete every account. Returns the number of rows removed.
    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM accounts", [])?;
        tracing::info!("Cleared {} account(s)", removed);
        Ok(removed)
    }

    /// Assign a group name and color to an account.
    pub fn update_group(&self, id: i64, name: &str, color: &str) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE accounts SET group_name = ?1, group_color = ?2 WHERE id = ?3",
            params![name, color, id],
        )?;
        if affected == 0 {
            return Err(Error::AccountNotFound(id));
        }
        Ok(())
    }

    /// Distinct non-empty groups, ordered by name.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT group_name, COALESCE(group_color, '')
             FROM accounts
             WHERE group_name IS NOT NULL AND group_name != ''
             ORDER BY group_name",
        )?;
        let groups = stmt
            .query_map([], |row| {
                Ok(Group {
                    name: row.get(0)?,
                    color: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        id: row.get(0)?,
        handle: row.get(1)?,
        display_name: row.get(2)?,
        profile_image: row.get(3)?,
        total_media: row.get(4)?,
        last_fetched: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        payload: row.get(6)?,
        filter: row.get(7)?,
        cursor: row.get(8)?,
        completed: row.get(9)?,
        group_name: row.get(10)?,
        group_color: row.get(11)?,
    })
}

/// Render a stored timestamp as `YYYY-MM-DD HH:MM` local time.
fn display_time(stored: Option<&str>) -> String {
    let Some(stored) = stored.map(str::trim).filter(|s| !s.is_empty()) else {
        return String::new();
    };

    let parsed = DateTime::parse_from_str(stored, STORED_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S%.f%z"))
        .or_else(|_| DateTime::parse_from_rfc3339(stored))
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(stored, "%Y-%m-%d %H:%M:%S%.f"));

    match parsed {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => stored.to_string(),
    }
}
