//! Record store abstraction.
//!
//! Trackers read and write records only through [`AuthorizationStore`], so
//! persistence can be swapped without touching transition logic.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::db::DbError;
use crate::models::{CaseRecord, DischargeRecord, FinalAuthorizationRecord, PreAuthorizationRecord};
use crate::settings::DeskConfig;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        StoreError::Lock(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed storage for every record the desk creates or mutates.
///
/// `put_*` replaces any existing record for the same case. Records come back
/// from `get_*` exactly as they were put. The two-record writes either store
/// both records or neither.
pub trait AuthorizationStore: Send + Sync {
    fn get_case(&self, case_id: &str) -> StoreResult<Option<CaseRecord>>;
    fn put_case(&self, case: &CaseRecord) -> StoreResult<()>;

    fn get_pre_auth(&self, case_id: &str) -> StoreResult<Option<PreAuthorizationRecord>>;
    fn put_pre_auth(&self, record: &PreAuthorizationRecord) -> StoreResult<()>;

    /// Register a case and its new pre-authorization.
    fn register_pre_auth(
        &self,
        case: &CaseRecord,
        record: &PreAuthorizationRecord,
    ) -> StoreResult<()>;

    fn get_final_auth(&self, case_id: &str) -> StoreResult<Option<FinalAuthorizationRecord>>;
    fn put_final_auth(&self, record: &FinalAuthorizationRecord) -> StoreResult<()>;

    fn get_discharge(&self, case_id: &str) -> StoreResult<Option<DischargeRecord>>;
    fn put_discharge(&self, record: &DischargeRecord) -> StoreResult<()>;

    /// Store the discharge data and the final-authorization request it produced.
    fn put_final_request(
        &self,
        discharge: &DischargeRecord,
        record: &FinalAuthorizationRecord,
    ) -> StoreResult<()>;

    /// Registered case identifiers in registration order.
    fn list_case_ids(&self) -> StoreResult<Vec<String>>;
}

/// Open the store selected by the configuration.
pub fn open_store(config: &DeskConfig) -> StoreResult<Box<dyn AuthorizationStore>> {
    match &config.database_path {
        Some(path) => {
            tracing::info!(path = %path, "opening sqlite store");
            Ok(Box::new(SqliteStore::open(path)?))
        }
        None => {
            tracing::info!("using in-memory store");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DischargeData, PatientData};

    /// Behaviour every store implementation must share.
    pub(crate) fn exercise_store(store: &dyn AuthorizationStore) {
        assert!(store.get_case("C1").unwrap().is_none());
        assert!(store.get_pre_auth("C1").unwrap().is_none());

        let case = CaseRecord::new("C1".into(), PatientData::default());
        store.put_case(&case).unwrap();
        store.put_case(&CaseRecord::new("C2".into(), PatientData::default())).unwrap();

        let mut pre = PreAuthorizationRecord::new("C1".into(), 50000.0);
        store.put_pre_auth(&pre).unwrap();
        pre.lifecycle
            .record_query_reply("q".into(), "r".into())
            .unwrap();
        store.put_pre_auth(&pre).unwrap();

        let final_auth = FinalAuthorizationRecord::new("C1".into(), 60000.0, 0.0);
        store.put_final_auth(&final_auth).unwrap();

        assert_eq!(store.get_case("C1").unwrap(), Some(case));
        assert_eq!(store.get_pre_auth("C1").unwrap(), Some(pre));
        assert_eq!(store.get_final_auth("C1").unwrap(), Some(final_auth));
        assert!(store.get_discharge("C1").unwrap().is_none());
        assert_eq!(store.list_case_ids().unwrap().len(), 2);

        let case3 = CaseRecord::new("C3".into(), PatientData::default());
        let pre3 = PreAuthorizationRecord::new("C3".into(), 20000.0);
        store.register_pre_auth(&case3, &pre3).unwrap();
        assert_eq!(store.get_case("C3").unwrap(), Some(case3));
        assert_eq!(store.get_pre_auth("C3").unwrap(), Some(pre3));

        let discharge = DischargeRecord::new(
            "C3".into(),
            DischargeData {
                final_bill_amount: 25000.0,
                ..Default::default()
            },
        );
        let final3 = FinalAuthorizationRecord::new("C3".into(), 25000.0, 0.0);
        store.put_final_request(&discharge, &final3).unwrap();
        assert_eq!(store.get_discharge("C3").unwrap(), Some(discharge));
        assert_eq!(store.get_final_auth("C3").unwrap(), Some(final3));
        assert_eq!(store.list_case_ids().unwrap().len(), 3);
    }

    #[test]
    fn test_open_store_defaults_to_memory() {
        let store = open_store(&DeskConfig::default()).unwrap();
        exercise_store(store.as_ref());
    }

    #[test]
    fn test_open_store_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = DeskConfig {
            database_path: Some(dir.path().join("desk.db").to_string_lossy().into_owned()),
        };
        let store = open_store(&config).unwrap();
        exercise_store(store.as_ref());
    }
}
