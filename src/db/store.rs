use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::command::{Command, Parameter};

/// Most-recent-first cap applied by `get_history`.
const HISTORY_LIMIT: usize = 100;

const BUSY_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Reserved for future optimistic-concurrency use.
    #[error("conflicting write")]
    Conflict,
    /// Cascade or trigger misuse detected by the database.
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// One recorded usage of a command: the compiled string that was injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub command_id: Uuid,
    pub command: String,
    pub timestamp: DateTime<Utc>,
}

/// Durable store for commands, parameters, usages and explanations, backed
/// by a single-file SQLite database with an FTS5 search index.
pub struct Store {
    conn: Connection,
}

/// Canonical DDL, executed in one transaction at init. The FTS triggers are
/// the sole writer of `commands_fts`; application code writes `commands`
/// only.
const INIT_QUERIES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS commands (
        id TEXT PRIMARY KEY,
        name VARCHAR(64) NOT NULL,
        description VARCHAR(255),
        template VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS parameters (
        id TEXT PRIMARY KEY,
        command_id TEXT,
        name VARCHAR(64) NOT NULL,
        description VARCHAR(255),
        default_value VARCHAR(255),
        FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
    )",
    "CREATE VIRTUAL TABLE IF NOT EXISTS commands_fts
        USING fts5(id UNINDEXED, name, template, description)",
    "CREATE TABLE IF NOT EXISTS notebook (
        command_id TEXT PRIMARY KEY,
        explanation TEXT,
        FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS history (
        command_id TEXT,
        usage_text TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE
    )",
    "CREATE INDEX IF NOT EXISTS idx_parameters_command_id ON parameters(command_id)",
    "CREATE INDEX IF NOT EXISTS idx_history_command_id ON history(command_id)",
    "CREATE TRIGGER IF NOT EXISTS commands_fts_insert
        AFTER INSERT ON commands
    BEGIN
        INSERT INTO commands_fts (id, name, template, description)
        VALUES (NEW.id, NEW.name, NEW.template, NEW.description);
    END",
    "CREATE TRIGGER IF NOT EXISTS commands_fts_update
        AFTER UPDATE ON commands
    BEGIN
        UPDATE commands_fts
        SET name = NEW.name,
            template = NEW.template,
            description = NEW.description
        WHERE id = NEW.id;
    END",
    "CREATE TRIGGER IF NOT EXISTS commands_fts_delete
        AFTER DELETE ON commands
    BEGIN
        DELETE FROM commands_fts WHERE id = OLD.id;
    END",
];

impl Store {
    /// Opens (or creates) the database file and installs the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut store = Store { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for query in INIT_QUERIES {
            tx.execute(query, [])?;
        }
        tx.commit()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        debug!("store schema initialized");
        Ok(())
    }

    /// Upserts the command row and, if present, its parameters in a single
    /// transaction. Parameters the caller dropped are not removed here; the
    /// manager passes them to `update_command` or `delete_parameters`.
    pub fn save(&mut self, cmd: &Command) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        upsert_command(&tx, cmd)?;
        upsert_parameters(&tx, cmd)?;
        tx.commit()?;
        debug!("command {} stored", cmd.id);
        Ok(())
    }

    /// Upserts the command and removes the stale parameter rows, atomically.
    pub fn update_command(
        &mut self,
        cmd: &Command,
        stale_params: &[Uuid],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        upsert_command(&tx, cmd)?;
        upsert_parameters(&tx, cmd)?;
        delete_parameters_in(&tx, stale_params)?;
        tx.commit()?;
        debug!(
            "command {} updated, {} stale parameter(s) removed",
            cmd.id,
            stale_params.len()
        );
        Ok(())
    }

    /// Fetches a command and its parameters in insertion order.
    pub fn get_command_by_id(&self, id: Uuid) -> Result<Command, StoreError> {
        let mut cmd = self
            .conn
            .query_row(
                "SELECT id, name, description, template FROM commands WHERE id = ?1",
                [id.to_string()],
                command_from_row,
            )
            .map_err(not_found_on_no_rows)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, default_value
             FROM parameters
             WHERE command_id = ?1
             ORDER BY rowid",
        )?;
        let params = stmt
            .query_map([id.to_string()], parameter_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        cmd.params = params;
        Ok(cmd)
    }

    /// All commands, parameter lists unpopulated.
    pub fn list_commands(&self) -> Result<Vec<Command>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, template FROM commands")?;
        let cmds = stmt
            .query_map([], command_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cmds)
    }

    /// Prefix full-text search over name, template and description, ranked
    /// by BM25 with name matches weighted highest. Parameter lists are left
    /// unpopulated. An empty or whitespace-only term matches nothing; FTS5
    /// rejects the bare `""*` query outright.
    pub fn search_command(&self, term: &str) -> Result<Vec<Command>, StoreError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.description, c.template
             FROM commands c
             INNER JOIN commands_fts fts ON c.id = fts.id
             WHERE commands_fts MATCH ?1
             ORDER BY bm25(commands_fts, 0, 15, 10, 5)",
        )?;

        // Double-quoting the term keeps FTS5 operators out of user input
        // while still allowing a prefix query.
        let query = format!("\"{}\"*", term.replace('"', "\"\""));
        let cmds = stmt
            .query_map([query], command_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cmds)
    }

    /// Removes a command; parameters, explanation and history cascade.
    pub fn delete_command(&self, id: Uuid) -> Result<(), StoreError> {
        let affected = self
            .conn
            .execute("DELETE FROM commands WHERE id = ?1", [id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Bulk-deletes parameter rows by id.
    pub fn delete_parameters(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        delete_parameters_in(&self.conn, ids)
    }

    /// Upserts the explanation row for a command.
    pub fn write_explanation(&self, command_id: Uuid, text: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO notebook (command_id, explanation) VALUES (?1, ?2)
             ON CONFLICT (command_id) DO UPDATE SET explanation = excluded.explanation",
            params![command_id.to_string(), text],
        )?;
        Ok(())
    }

    pub fn read_explanation(&self, command_id: Uuid) -> Result<String, StoreError> {
        self.conn
            .query_row(
                "SELECT explanation FROM notebook WHERE command_id = ?1",
                [command_id.to_string()],
                |row| row.get(0),
            )
            .map_err(not_found_on_no_rows)
    }

    pub fn delete_explanation(&self, command_id: Uuid) -> Result<(), StoreError> {
        let affected = self.conn.execute(
            "DELETE FROM notebook WHERE command_id = ?1",
            [command_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Appends one usage row with the current UTC timestamp.
    pub fn insert_usage(&self, command_id: Uuid, compiled: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO history (command_id, usage_text, timestamp) VALUES (?1, ?2, ?3)",
            params![command_id.to_string(), compiled, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Usages for a command, most recent first, capped at the last 100.
    /// Fails with `NotFound` when the command itself doesn't exist.
    pub fn get_history(&self, command_id: Uuid) -> Result<Vec<Usage>, StoreError> {
        self.conn
            .query_row(
                "SELECT 1 FROM commands WHERE id = ?1",
                [command_id.to_string()],
                |_| Ok(()),
            )
            .map_err(not_found_on_no_rows)?;

        let mut stmt = self.conn.prepare(
            "SELECT command_id, usage_text, timestamp
             FROM history
             WHERE command_id = ?1
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?2",
        )?;
        let usages = stmt
            .query_map(
                params![command_id.to_string(), HISTORY_LIMIT],
                usage_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(usages)
    }

    /// Releases the database handle.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::Unavailable(e.to_string()))
    }
}

fn upsert_command(tx: &Transaction, cmd: &Command) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO commands (id, name, description, template) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            template = excluded.template",
        params![cmd.id.to_string(), cmd.name, cmd.description, cmd.template],
    )?;
    Ok(())
}

fn upsert_parameters(tx: &Transaction, cmd: &Command) -> Result<(), StoreError> {
    if cmd.params.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["(?, ?, ?, ?, ?)"; cmd.params.len()].join(", ");
    let query = format!(
        "INSERT INTO parameters (id, command_id, name, description, default_value)
         VALUES {placeholders}
         ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            default_value = excluded.default_value"
    );

    let mut values = Vec::with_capacity(cmd.params.len() * 5);
    for param in &cmd.params {
        values.push(param.id.to_string());
        values.push(cmd.id.to_string());
        values.push(param.name.clone());
        values.push(param.description.clone());
        values.push(param.default_value.clone());
    }

    tx.execute(&query, params_from_iter(values.iter()))?;
    Ok(())
}

fn delete_parameters_in(conn: &Connection, ids: &[Uuid]) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!("DELETE FROM parameters WHERE id IN ({placeholders})");
    let values: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    conn.execute(&query, params_from_iter(values.iter()))?;
    Ok(())
}

fn command_from_row(row: &Row) -> rusqlite::Result<Command> {
    Ok(Command {
        id: uuid_from_row(row, 0)?,
        name: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        template: row.get(3)?,
        params: Vec::new(),
    })
}

fn parameter_from_row(row: &Row) -> rusqlite::Result<Parameter> {
    Ok(Parameter {
        id: uuid_from_row(row, 0)?,
        name: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        default_value: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

fn usage_from_row(row: &Row) -> rusqlite::Result<Usage> {
    let raw: String = row.get(2)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Usage {
        command_id: uuid_from_row(row, 0)?,
        command: row.get(1)?,
        timestamp,
    })
}

fn uuid_from_row(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn not_found_on_no_rows(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}
