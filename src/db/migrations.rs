use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 1;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys=ON", [])?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn).unwrap_or(0);

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            log::debug!("applied schema migration v{}", version);
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> {
    let mut migrations: HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations
}

/// Migration v1: Initial schema
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    // Users table
    tx.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name TEXT NOT NULL,
            phone TEXT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin','counselor')),
            password_salt TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;

    // Server-side login sessions; the marker file only carries the token
    tx.execute(
        "CREATE TABLE sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_ts INTEGER NOT NULL,
            expires_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_sessions_user ON sessions(user_id)",
        [],
    )?;

    // Leads table
    tx.execute(
        "CREATE TABLE leads (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT NULL,
            phone TEXT NULL,
            country TEXT NULL,
            course TEXT NULL,
            source TEXT NULL,
            stage_index INTEGER NOT NULL CHECK(stage_index BETWEEN 0 AND 17),
            counselor_id INTEGER NULL REFERENCES users(id),
            manager_id INTEGER NULL REFERENCES users(id),
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_leads_stage ON leads(stage_index)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_leads_counselor ON leads(counselor_id)",
        [],
    )?;

    // Task log (append-only)
    tx.execute(
        "CREATE TABLE lead_tasks (
            id INTEGER PRIMARY KEY,
            lead_id INTEGER NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            task_type TEXT NOT NULL,
            details_json TEXT NOT NULL,
            remarks TEXT NULL,
            actor TEXT NOT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_lead_tasks_lead ON lead_tasks(lead_id, id)",
        [],
    )?;
    // Note: details_json holds the serialized task kind; task_type duplicates its tag for reporting

    // Stage history (append-only)
    tx.execute(
        "CREATE TABLE stage_history (
            id INTEGER PRIMARY KEY,
            lead_id INTEGER NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            stage TEXT NOT NULL,
            actor TEXT NOT NULL,
            origin TEXT NOT NULL CHECK(origin IN ('system','import','assignment','task','manual','override')),
            entry_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_stage_history_lead ON stage_history(lead_id, id)",
        [],
    )?;
    // Note: stage is stored by label so the log stays readable if the pipeline is ever renumbered

    // Remarks (append-only)
    tx.execute(
        "CREATE TABLE remarks (
            id INTEGER PRIMARY KEY,
            lead_id INTEGER NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            task_id INTEGER NULL REFERENCES lead_tasks(id) ON DELETE SET NULL,
            note TEXT NOT NULL,
            actor TEXT NOT NULL,
            entry_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_remarks_lead ON remarks(lead_id, id)",
        [],
    )?;

    // University application credentials
    tx.execute(
        "CREATE TABLE university_apps (
            id INTEGER PRIMARY KEY,
            lead_id INTEGER NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            task_id INTEGER NULL REFERENCES lead_tasks(id) ON DELETE SET NULL,
            university_name TEXT NOT NULL,
            url TEXT NULL,
            username TEXT NULL,
            password TEXT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_university_apps_lead ON university_apps(lead_id, id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_stage_index_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO leads (uuid, name, stage_index, created_ts, modified_ts) VALUES ('u', 'n', 18, 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
