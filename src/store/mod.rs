mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::models::{BudgetCatalog, Project, ProjectAllocation};

pub(crate) const CATALOG_KEY: &str = "budget_catalog";
pub(crate) const LEDGER_KEY: &str = "allocation_ledger";
pub(crate) const PROJECTS_KEY: &str = "projects";

/// Outcome of loading a persisted record.
///
/// `Recovered` means a record existed but could not be decoded; it has been
/// logged and treated as absent. Callers can distinguish that from a store
/// that was legitimately empty, which matters operationally even though
/// both hydrate to the same default state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Loaded<T> {
    Value(T),
    Absent,
    Recovered,
}

impl<T> Loaded<T> {
    pub(crate) fn was_recovered(&self) -> bool {
        matches!(self, Loaded::Recovered)
    }

    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            Loaded::Value(v) => Some(v),
            Loaded::Absent | Loaded::Recovered => None,
        }
    }
}

/// Key-value record store backed by a single sqlite file. Each record is a
/// whole-document JSON blob, overwritten wholesale on save — no merging.
pub(crate) struct Store {
    conn: Connection,
}

impl Store {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .context("Failed to set database pragmas")?;
        let mut store = Self { conn };
        store.migrate().context("Database migration failed")?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Raw records ───────────────────────────────────────────

    pub(crate) fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT value FROM records WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn put(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO records (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Decode the blob under `key`. An unreadable blob is logged and reported
    /// as `Recovered` rather than failing the load; the next save overwrites
    /// it. Best-effort recovery favours availability over preserving a record
    /// nothing can read anyway.
    fn load_record<T: DeserializeOwned>(&self, key: &str) -> Result<Loaded<T>> {
        match self.get(key)? {
            None => Ok(Loaded::Absent),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Loaded::Value(value)),
                Err(e) => {
                    warn!(key, error = %e, "unreadable record; treating as absent");
                    Ok(Loaded::Recovered)
                }
            },
        }
    }

    fn save_record<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode record '{key}'"))?;
        self.put(key, &raw)
    }

    // ── Typed records ─────────────────────────────────────────

    pub(crate) fn load_catalog(&self) -> Result<Loaded<BudgetCatalog>> {
        self.load_record(CATALOG_KEY)
    }

    pub(crate) fn save_catalog(&self, catalog: &BudgetCatalog) -> Result<()> {
        self.save_record(CATALOG_KEY, catalog)
    }

    pub(crate) fn load_ledger(&self) -> Result<Loaded<Vec<ProjectAllocation>>> {
        self.load_record(LEDGER_KEY)
    }

    pub(crate) fn save_ledger(&self, ledger: &[ProjectAllocation]) -> Result<()> {
        self.save_record(LEDGER_KEY, &ledger)
    }

    pub(crate) fn load_projects(&self) -> Result<Loaded<Vec<Project>>> {
        self.load_record(PROJECTS_KEY)
    }

    pub(crate) fn save_projects(&self, projects: &[Project]) -> Result<()> {
        self.save_record(PROJECTS_KEY, &projects)
    }
}
