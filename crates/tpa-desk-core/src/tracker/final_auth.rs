//! Final-authorization tracker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tpa_desk_llm::{GapAnalyzer, LetterGenerator, LetterPhase};
use tracing::{debug, info, warn};

use super::blocks::{final_query_block, final_request_block, letter_request};
use super::{check_amount, CaseLocks, RecordKind, TrackerError, TrackerResult};
use crate::models::{
    parse_approval_date, ApprovalDetails, CaseRecord, DischargeData, DischargeRecord,
    FinalAuthorizationRecord, GapAnalysis,
};
use crate::store::AuthorizationStore;

/// Outcome of a final-authorization request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalAuthRequest {
    /// Generated request letter
    pub request_text: String,
    pub additional_amount_requested: f64,
}

/// Runs the final-authorization cycle of a case.
pub struct FinalAuthTracker<'a> {
    store: &'a dyn AuthorizationStore,
    letters: &'a dyn LetterGenerator,
    gaps: &'a dyn GapAnalyzer,
    locks: &'a CaseLocks,
}

impl<'a> FinalAuthTracker<'a> {
    pub fn new(
        store: &'a dyn AuthorizationStore,
        letters: &'a dyn LetterGenerator,
        gaps: &'a dyn GapAnalyzer,
        locks: &'a CaseLocks,
    ) -> Self {
        Self {
            store,
            letters,
            gaps,
            locks,
        }
    }

    /// Store the discharge data and draft the final-authorization request.
    ///
    /// The pre-authorization's approved amount (0 if none) is copied into the
    /// new record. A pending final authorization is replaced; a decided one
    /// fails with [`TrackerError::DuplicateCase`].
    pub fn create_request(
        &self,
        case_id: &str,
        discharge: DischargeData,
    ) -> TrackerResult<FinalAuthRequest> {
        let _guard = self.locks.lock(case_id)?;

        let pre_auth = self
            .store
            .get_pre_auth(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::PreAuthorization, case_id))?;
        let case = self.load_case(case_id)?;
        let final_bill = check_amount("final bill amount", discharge.final_bill_amount)?;

        if let Some(existing) = self.store.get_final_auth(case_id)? {
            if existing.status().is_terminal() {
                return Err(TrackerError::DuplicateCase(case_id.to_string()));
            }
        }

        let pre_auth_approved = match pre_auth.approved_amount() {
            Some(amount) => amount,
            None => {
                warn!(
                    case_id,
                    status = %pre_auth.status(),
                    "final authorization requested without pre-authorization approval"
                );
                0.0
            }
        };

        let record =
            FinalAuthorizationRecord::new(case_id.to_string(), final_bill, pre_auth_approved);
        let discharge = DischargeRecord::new(case_id.to_string(), discharge);

        let request = letter_request(
            &case,
            final_request_block(&case, &pre_auth, &record, &discharge),
            LetterPhase::FinalAuthorization,
        );
        debug!(case_id, "drafting final-authorization request");
        let request_text = self.letters.generate_letter(&request)?;

        self.store.put_final_request(&discharge, &record)?;

        info!(
            case_id,
            final_bill,
            pre_auth_approved,
            additional = record.additional_amount_requested,
            "final authorization requested"
        );
        Ok(FinalAuthRequest {
            request_text,
            additional_amount_requested: record.additional_amount_requested,
        })
    }

    /// Draft a reply to an insurer query on the final bill.
    pub fn record_query(&self, case_id: &str, query: &str) -> TrackerResult<String> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        let discharge = self
            .store
            .get_discharge(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Discharge, case_id))?;
        let case = self.load_case(case_id)?;

        let request = letter_request(
            &case,
            final_query_block(query, &discharge),
            LetterPhase::FinalAuthorization,
        );
        debug!(case_id, "drafting final-authorization query reply");
        let response = self.letters.generate_letter(&request)?;

        record
            .lifecycle
            .record_query_reply(query.to_string(), response.clone())
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_final_auth(&record)?;

        info!(
            case_id,
            rounds = record.lifecycle.queries.len(),
            status = %record.status(),
            "final-authorization query replied"
        );
        Ok(response)
    }

    /// Record the insurer's final approval and analyse the shortfall.
    pub fn record_approval(
        &self,
        case_id: &str,
        approved_amount: f64,
        approval_number: &str,
        approval_date: &str,
        deductions: BTreeMap<String, f64>,
    ) -> TrackerResult<GapAnalysis> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        let approved_amount = check_amount("approved amount", approved_amount)?;
        for amount in deductions.values() {
            check_amount("deduction", *amount)?;
        }
        let approval_date = parse_approval_date(approval_date)
            .map_err(|_| TrackerError::InvalidDate(approval_date.to_string()))?;

        let billed = record.final_bill_amount;
        let deductions_json = serde_json::to_string_pretty(&deductions)?;
        debug!(case_id, billed, approved_amount, "requesting gap analysis");
        let analysis = self
            .gaps
            .analyze_gap(billed, approved_amount, &deductions_json)?;

        record
            .approve(
                ApprovalDetails::new(approved_amount, approval_number.to_string(), approval_date),
                deductions.clone(),
            )
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_final_auth(&record)?;

        let gap = GapAnalysis::compute(billed, approved_amount, deductions, analysis);
        if gap.requires_escalation {
            warn!(
                case_id,
                gap_amount = gap.gap_amount,
                gap_percentage = gap.gap_percentage,
                "final-authorization gap requires escalation"
            );
        }
        info!(
            case_id,
            approved_amount,
            gap_percentage = gap.gap_percentage,
            status = %record.status(),
            "final authorization approved"
        );
        Ok(gap)
    }

    pub fn record_rejection(&self, case_id: &str, reason: &str) -> TrackerResult<()> {
        let _guard = self.locks.lock(case_id)?;

        let mut record = self.load_open(case_id)?;
        record
            .lifecycle
            .reject(reason.to_string())
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        self.store.put_final_auth(&record)?;

        info!(case_id, status = %record.status(), "final authorization rejected");
        Ok(())
    }

    pub fn get(&self, case_id: &str) -> TrackerResult<FinalAuthorizationRecord> {
        self.store
            .get_final_auth(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::FinalAuthorization, case_id))
    }

    /// Discharge data stored with the final-authorization request.
    pub fn discharge(&self, case_id: &str) -> TrackerResult<DischargeRecord> {
        self.store
            .get_discharge(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Discharge, case_id))
    }

    fn load_case(&self, case_id: &str) -> TrackerResult<CaseRecord> {
        self.store
            .get_case(case_id)?
            .ok_or_else(|| TrackerError::not_found(RecordKind::Case, case_id))
    }

    fn load_open(&self, case_id: &str) -> TrackerResult<FinalAuthorizationRecord> {
        let record = self.get(case_id)?;
        record
            .lifecycle
            .ensure_open()
            .map_err(|e| TrackerError::terminal(case_id, e))?;
        Ok(record)
    }
}
