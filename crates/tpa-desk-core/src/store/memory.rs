//! In-process record store.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{AuthorizationStore, StoreResult};
use crate::models::{CaseRecord, DischargeRecord, FinalAuthorizationRecord, PreAuthorizationRecord};

#[derive(Debug, Default)]
struct Records {
    cases: HashMap<String, CaseRecord>,
    pre_auths: HashMap<String, PreAuthorizationRecord>,
    final_auths: HashMap<String, FinalAuthorizationRecord>,
    discharges: HashMap<String, DischargeRecord>,
}

/// Hash-map store; contents are lost when the process exits.
///
/// All maps sit behind one mutex so paired writes are seen together.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthorizationStore for MemoryStore {
    fn get_case(&self, case_id: &str) -> StoreResult<Option<CaseRecord>> {
        Ok(self.records.lock()?.cases.get(case_id).cloned())
    }

    fn put_case(&self, case: &CaseRecord) -> StoreResult<()> {
        self.records
            .lock()?
            .cases
            .insert(case.case_id.clone(), case.clone());
        Ok(())
    }

    fn get_pre_auth(&self, case_id: &str) -> StoreResult<Option<PreAuthorizationRecord>> {
        Ok(self.records.lock()?.pre_auths.get(case_id).cloned())
    }

    fn put_pre_auth(&self, record: &PreAuthorizationRecord) -> StoreResult<()> {
        self.records
            .lock()?
            .pre_auths
            .insert(record.case_id.clone(), record.clone());
        Ok(())
    }

    fn register_pre_auth(
        &self,
        case: &CaseRecord,
        record: &PreAuthorizationRecord,
    ) -> StoreResult<()> {
        let mut records = self.records.lock()?;
        records.cases.insert(case.case_id.clone(), case.clone());
        records
            .pre_auths
            .insert(record.case_id.clone(), record.clone());
        Ok(())
    }

    fn get_final_auth(&self, case_id: &str) -> StoreResult<Option<FinalAuthorizationRecord>> {
        Ok(self.records.lock()?.final_auths.get(case_id).cloned())
    }

    fn put_final_auth(&self, record: &FinalAuthorizationRecord) -> StoreResult<()> {
        self.records
            .lock()?
            .final_auths
            .insert(record.case_id.clone(), record.clone());
        Ok(())
    }

    fn get_discharge(&self, case_id: &str) -> StoreResult<Option<DischargeRecord>> {
        Ok(self.records.lock()?.discharges.get(case_id).cloned())
    }

    fn put_discharge(&self, record: &DischargeRecord) -> StoreResult<()> {
        self.records
            .lock()?
            .discharges
            .insert(record.case_id.clone(), record.clone());
        Ok(())
    }

    fn put_final_request(
        &self,
        discharge: &DischargeRecord,
        record: &FinalAuthorizationRecord,
    ) -> StoreResult<()> {
        let mut records = self.records.lock()?;
        records
            .discharges
            .insert(discharge.case_id.clone(), discharge.clone());
        records
            .final_auths
            .insert(record.case_id.clone(), record.clone());
        Ok(())
    }

    fn list_case_ids(&self) -> StoreResult<Vec<String>> {
        let records = self.records.lock()?;
        let mut entries: Vec<(&str, &str)> = records
            .cases
            .values()
            .map(|c| (c.registered_at.as_str(), c.case_id.as_str()))
            .collect();
        entries.sort();
        Ok(entries.into_iter().map(|(_, id)| id.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::exercise_store;

    #[test]
    fn test_memory_store_contract() {
        exercise_store(&MemoryStore::new());
    }

    #[test]
    fn test_returned_records_are_copies() {
        let store = MemoryStore::new();
        store
            .put_pre_auth(&PreAuthorizationRecord::new("C1".into(), 100.0))
            .unwrap();

        let mut copy = store.get_pre_auth("C1").unwrap().unwrap();
        copy.requested_amount = 1.0;

        assert_eq!(store.get_pre_auth("C1").unwrap().unwrap().requested_amount, 100.0);
    }
}
