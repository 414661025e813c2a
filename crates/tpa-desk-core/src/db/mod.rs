//! SQLite database layer for the TPA desk.

mod authorizations;
mod cases;
mod discharges;
mod schema;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::{CaseRecord, DischargeRecord, FinalAuthorizationRecord, PreAuthorizationRecord};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction.
    pub fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    /// Register a case together with its pre-authorization; neither is
    /// written if the other fails.
    pub fn register_pre_auth(
        &mut self,
        case: &CaseRecord,
        record: &PreAuthorizationRecord,
    ) -> DbResult<()> {
        let tx = self.transaction()?;
        cases::write_case(&tx, case)?;
        authorizations::write_pre_auth(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Store discharge data and the final-authorization request in one transaction.
    pub fn put_final_request(
        &mut self,
        discharge: &DischargeRecord,
        record: &FinalAuthorizationRecord,
    ) -> DbResult<()> {
        let tx = self.transaction()?;
        discharges::write_discharge(&tx, discharge)?;
        authorizations::write_final_auth(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// All registered case identifiers, oldest registration first.
    pub fn list_case_ids(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT case_id FROM cases ORDER BY registered_at, case_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
