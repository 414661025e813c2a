//! Pre-authorization tracker.

use tpa_desk_llm::{LetterGenerator, LetterPhase};
use tracing::{debug, info};

use super::blocks::{letter_request, pre_auth_query_block};
use super::{check_amount, CaseLocks, RecordKind, TrackerError, TrackerResult};
use crate::models::{
    parse_approval_date, ApprovalDetails, CaseRecord, PatientData, PreAuthorizationRecord,
};
use crate::store::AuthorizationStore;

/// Runs the pre-authorization cycle of a case.
pub struct PreAuthTracker<'a> {
    store: &'a dyn AuthorizationStore,
    letters: &'a dyn LetterGenerator,
    locks: &'a CaseLocks,
}

impl<'a> PreAuthTracker<'a> {
    pub fn new(
        store: &'a dyn AuthorizationStore,
        letters: &'a dyn LetterGenerator,
        locks: &'a CaseLocks,
    ) -> Self {
        Self {
            store,
            letters,
            locks,
        }
    }

    /// Register the case and open a pending pre-authorization.
    ///
    /// Fails with [`TrackerError::DuplicateCase`] if the case already has one;
    /// use [`recreate_request`](Self::recreate_request) to replace it.
    pub fn create_request(
        &self,
        case_id: &str,
        patient: PatientData,
        estimated_cost: f64,
    ) -> TrackerResult<PreAuthorizationRecord> {
        self.open_request(case_id, patient, estimated_cost, false)
    }

    /// Register the case and open a pending pre-authorization, discarding any
    /// existing one. A final authorization already created for the case keeps
    /// its snapshot of the old approved amount.
    pub fn recreate_request(
        &self,
        case_id: &str,
        patient: PatientData,
        estimated_cost: f64,
    ) -> TrackerResult<PreAuthorizationRecord> {
        self.open_request(case_id, patient, estimated_cost, true)
    }

    /// Draft a reply to an insurer query and append it to the record.
    ///
    /// Returns the generated reply for delivery to the insurer.
    pub fn record_query(&self, case_id: &str, query: &str) -> TrackerResult<String> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        let case = self
            .store
            .get_case(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Case, case_id))?;

        let request = letter_request(
            &case,
            pre_auth_query_block(query),
            LetterPhase::PreAuthorization,
        );
        debug!(case_id, "drafting pre-authorization query reply");
        let response = self.letters.generate_letter(&request)?;

        record
            .lifecycle
            .record_query_reply(query.to_string(), response.clone())
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_pre_auth(&record)?;

        info!(
            case_id,
            rounds = record.lifecycle.queries.len(),
            status = %record.status(),
            "pre-authorization query replied"
        );
        Ok(response)
    }

    /// Record full approval; returns the approved amount.
    ///
    /// Amounts above the requested amount are accepted.
    pub fn record_approval(
        &self,
        case_id: &str,
        approved_amount: f64,
        approval_number: &str,
        approval_date: &str,
    ) -> TrackerResult<f64> {
        self.decide(case_id, approved_amount, approval_number, approval_date, false)
    }

    /// Record approval of less than the requested amount; returns the approved amount.
    pub fn record_partial_approval(
        &self,
        case_id: &str,
        approved_amount: f64,
        approval_number: &str,
        approval_date: &str,
    ) -> TrackerResult<f64> {
        self.decide(case_id, approved_amount, approval_number, approval_date, true)
    }

    pub fn record_rejection(&self, case_id: &str, reason: &str) -> TrackerResult<()> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        record
            .lifecycle
            .reject(reason.to_string())
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_pre_auth(&record)?;

        info!(case_id, status = %record.status(), "pre-authorization rejected");
        Ok(())
    }

    pub fn get(&self, case_id: &str) -> TrackerResult<PreAuthorizationRecord> {
        self.store
            .get_pre_auth(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::PreAuthorization, case_id))
    }

    fn open_request(
        &self,
        case_id: &str,
        patient: PatientData,
        estimated_cost: f64,
        replace: bool,
    ) -> TrackerResult<PreAuthorizationRecord> {
        let estimated_cost = check_amount("estimated cost", estimated_cost)?;

        let _guard = self.locks.lock(case_id)?;

        if !replace && self.store.get_pre_auth(case_id)?.is_some() {
            return Err(TrackerError::DuplicateCase(case_id.to_string()));
        }

        let case = CaseRecord::new(case_id.to_string(), patient);
        let record = PreAuthorizationRecord::new(case_id.to_string(), estimated_cost);
        self.store.register_pre_auth(&case, &record)?;

        info!(
            case_id,
            requested_amount = estimated_cost,
            replaced = replace,
            "pre-authorization requested"
        );
        Ok(record)
    }

    fn decide(
        &self,
        case_id: &str,
        approved_amount: f64,
        approval_number: &str,
        approval_date: &str,
        partial: bool,
    ) -> TrackerResult<f64> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        let approved_amount = check_amount("approved amount", approved_amount)?;
        let approval_date = parse_approval_date(approval_date)
            .map_err(|_| TrackerError::InvalidDate(approval_date.to_string()))?;

        let approval =
            ApprovalDetails::new(approved_amount, approval_number.to_string(), approval_date);
        let decided = if partial {
            record.lifecycle.approve_partially(approval)
        } else {
            record.lifecycle.approve(approval)
        };
        decided.map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_pre_auth(&record)?;

        info!(
            case_id,
            approved_amount,
            requested_amount = record.requested_amount,
            status = %record.status(),
            "pre-authorization decided"
        );
        Ok(approved_amount)
    }

    /// Load a pre-authorization that still accepts transitions.
    fn load_open(&self, case_id: &str) -> TrackerResult<PreAuthorizationRecord> {
        let record = self.get(case_id)?;
        record
            .lifecycle
            .ensure_open()
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        Ok(record)
    }
}
