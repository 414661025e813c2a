//! SQLite-backed record store.

use std::path::Path;
use std::sync::Mutex;

use super::{AuthorizationStore, StoreResult};
use crate::db::Database;
use crate::models::{CaseRecord, DischargeRecord, FinalAuthorizationRecord, PreAuthorizationRecord};

/// Serialises access to a single SQLite connection.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl AuthorizationStore for SqliteStore {
    fn get_case(&self, case_id: &str) -> StoreResult<Option<CaseRecord>> {
        Ok(self.db.lock()?.get_case(case_id)?)
    }

    fn put_case(&self, case: &CaseRecord) -> StoreResult<()> {
        Ok(self.db.lock()?.upsert_case(case)?)
    }

    fn get_pre_auth(&self, case_id: &str) -> StoreResult<Option<PreAuthorizationRecord>> {
        Ok(self.db.lock()?.get_pre_auth(case_id)?)
    }

    fn put_pre_auth(&self, record: &PreAuthorizationRecord) -> StoreResult<()> {
        Ok(self.db.lock()?.upsert_pre_auth(record)?)
    }

    fn register_pre_auth(
        &self,
        case: &CaseRecord,
        record: &PreAuthorizationRecord,
    ) -> StoreResult<()> {
        Ok(self.db.lock()?.register_pre_auth(case, record)?)
    }

    fn get_final_auth(&self, case_id: &str) -> StoreResult<Option<FinalAuthorizationRecord>> {
        Ok(self.db.lock()?.get_final_auth(case_id)?)
    }

    fn put_final_auth(&self, record: &FinalAuthorizationRecord) -> StoreResult<()> {
        Ok(self.db.lock()?.upsert_final_auth(record)?)
    }

    fn get_discharge(&self, case_id: &str) -> StoreResult<Option<DischargeRecord>> {
        Ok(self.db.lock()?.get_discharge(case_id)?)
    }

    fn put_discharge(&self, record: &DischargeRecord) -> StoreResult<()> {
        Ok(self.db.lock()?.upsert_discharge(record)?)
    }

    fn put_final_request(
        &self,
        discharge: &DischargeRecord,
        record: &FinalAuthorizationRecord,
    ) -> StoreResult<()> {
        Ok(self.db.lock()?.put_final_request(discharge, record)?)
    }

    fn list_case_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.db.lock()?.list_case_ids()?)
    }
}
