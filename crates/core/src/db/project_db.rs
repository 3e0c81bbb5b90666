use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::db::{ProgramRecord, SliceRunRecord, SliceRunStatus};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// A stored value could not be decoded.
    #[error("Corrupt {column} value '{value}' in the project database")]
    CorruptValue { column: &'static str, value: String },
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed project database: registered programs and slice run history.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database with the full schema, for tests and dry runs.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> DbResult<i32> {
        current_schema_version(&self.conn)
    }

    /// Insert a program record and return its row id.
    pub fn insert_program(&self, record: &ProgramRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO programs (name, path, hash)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.name, record.path, record.hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all programs (ordered by id).
    pub fn list_programs(&self) -> DbResult<Vec<ProgramRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, path, hash
            FROM programs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProgramRecord { name: row.get(0)?, path: row.get(1)?, hash: row.get(2)? })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Insert a slice run record and return its row id.
    pub fn insert_slice_run(&self, record: &SliceRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO slice_runs (program, seed, direction, data_options, control_options, slice_size, edge_count, status, message, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.program,
                record.seed,
                record.direction,
                record.data_options,
                record.control_options,
                record.slice_size as i64,
                record.edge_count as i64,
                record.status.as_str(),
                record.message,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List slice runs, optionally filtered by program name.
    pub fn list_slice_runs(&self, program: Option<&str>) -> DbResult<Vec<SliceRunRecord>> {
        type RawRun = (SliceRunRecord, String);

        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRun> {
            let slice_size: i64 = row.get(5)?;
            let edge_count: i64 = row.get(6)?;
            let record = SliceRunRecord {
                program: row.get(0)?,
                seed: row.get(1)?,
                direction: row.get(2)?,
                data_options: row.get(3)?,
                control_options: row.get(4)?,
                slice_size: slice_size.max(0) as usize,
                edge_count: edge_count.max(0) as usize,
                status: SliceRunStatus::Failed,
                message: row.get(8)?,
                started_at: row.get(9)?,
                finished_at: row.get(10)?,
            };
            Ok((record, row.get(7)?))
        }

        let sql_all = r#"
            SELECT program, seed, direction, data_options, control_options, slice_size, edge_count, status, message, started_at, finished_at
            FROM slice_runs
            ORDER BY id
            "#;
        let sql_filtered = r#"
            SELECT program, seed, direction, data_options, control_options, slice_size, edge_count, status, message, started_at, finished_at
            FROM slice_runs
            WHERE program = ?1
            ORDER BY id
            "#;

        let mut stmt = self.conn.prepare(if program.is_some() { sql_filtered } else { sql_all })?;
        let rows = if let Some(name) = program {
            stmt.query_map(params![name], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            let (mut record, status) = row?;
            record.status = status
                .parse()
                .map_err(|_| DbError::CorruptValue { column: "slice_runs.status", value: status })?;
            out.push(record);
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: programs table
/// - 2: slice_runs table
/// - 3: message column on slice_runs (guarded in code)
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS programs (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                hash TEXT
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS slice_runs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                program         TEXT NOT NULL,
                seed            TEXT NOT NULL,
                direction       TEXT NOT NULL,
                data_options    TEXT NOT NULL,
                control_options TEXT NOT NULL,
                slice_size      INTEGER NOT NULL,
                edge_count      INTEGER NOT NULL,
                status          TEXT NOT NULL,
                started_at      TEXT NOT NULL,
                finished_at     TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
        current_version = 2;
    }

    if current_version < 3 {
        if !column_exists(conn, "slice_runs", "message")? {
            conn.execute("ALTER TABLE slice_runs ADD COLUMN message TEXT;", [])?;
        }
        conn.execute("PRAGMA user_version = 3;", [])?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let pragma = format!("PRAGMA table_info({table});");
    let mut stmt = conn.prepare(&pragma)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in rows {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(program: &str, status: SliceRunStatus) -> SliceRunRecord {
        SliceRunRecord {
            program: program.to_string(),
            seed: "NORMAL n0:4".into(),
            direction: "backward".into(),
            data_options: "full".into(),
            control_options: "full".into(),
            slice_size: 7,
            edge_count: 9,
            status,
            message: None,
            started_at: "2024-01-01T00:00:00Z".into(),
            finished_at: "2024-01-01T00:00:01Z".into(),
        }
    }

    #[test]
    fn fresh_database_is_at_current_version() {
        let db = ProjectDb::open_in_memory().expect("db");
        assert_eq!(db.schema_version().expect("version"), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn runs_are_filtered_by_program() {
        let db = ProjectDb::open_in_memory().expect("db");
        db.insert_slice_run(&run("demo", SliceRunStatus::Succeeded)).expect("insert");
        db.insert_slice_run(&run("other", SliceRunStatus::Failed)).expect("insert");

        let all = db.list_slice_runs(None).expect("list");
        assert_eq!(all.len(), 2);
        let demo = db.list_slice_runs(Some("demo")).expect("list");
        assert_eq!(demo, vec![run("demo", SliceRunStatus::Succeeded)]);
    }

    #[test]
    fn unknown_status_is_reported_as_corrupt() {
        let db = ProjectDb::open_in_memory().expect("db");
        db.insert_slice_run(&run("demo", SliceRunStatus::Succeeded)).expect("insert");
        db.connection().execute("UPDATE slice_runs SET status = 'exploded'", []).expect("update");
        let err = db.list_slice_runs(None).unwrap_err();
        assert!(matches!(err, DbError::CorruptValue { .. }));
    }
}
