//! Authorization summary export for hospital billing systems.

use serde::{Deserialize, Serialize};
use tpa_desk_llm::LetterPhase;

use crate::models::{FinalAuthorizationRecord, PreAuthorizationRecord};
use crate::store::{AuthorizationStore, StoreResult};

/// One authorization of one case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationSummary {
    pub case_id: String,
    pub patient_name: String,
    pub phase: LetterPhase,
    /// Estimated cost for pre-authorization, final bill for final authorization
    pub requested_amount: f64,
    pub approved_amount: Option<f64>,
    pub approval_number: Option<String>,
    /// Status label (`Query Replied`, `Approved`, ...)
    pub status: String,
    pub query_rounds: usize,
    pub request_date: String,
}

impl AuthorizationSummary {
    pub fn from_pre_auth(record: &PreAuthorizationRecord, patient_name: &str) -> Self {
        Self {
            case_id: record.case_id.clone(),
            patient_name: patient_name.to_string(),
            phase: LetterPhase::PreAuthorization,
            requested_amount: record.requested_amount,
            approved_amount: record.approved_amount(),
            approval_number: record.approval_number().map(str::to_string),
            status: record.status().label().to_string(),
            query_rounds: record.lifecycle.queries.len(),
            request_date: record.request_date.clone(),
        }
    }

    pub fn from_final_auth(record: &FinalAuthorizationRecord, patient_name: &str) -> Self {
        Self {
            case_id: record.case_id.clone(),
            patient_name: patient_name.to_string(),
            phase: LetterPhase::FinalAuthorization,
            requested_amount: record.final_bill_amount,
            approved_amount: record.approved_amount(),
            approval_number: record
                .lifecycle
                .approval
                .as_ref()
                .map(|a| a.approval_number.clone()),
            status: record.status().label().to_string(),
            query_rounds: record.lifecycle.queries.len(),
            request_date: record.request_date.clone(),
        }
    }
}

/// Summary rows for every registered case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationExport {
    /// Unique export identifier
    pub export_id: String,
    /// Export timestamp
    pub exported_at: String,
    pub authorizations: Vec<AuthorizationSummary>,
    pub total_requested: f64,
    pub total_approved: f64,
}

const CSV_HEADER: &str = concat!(
    "case_id,patient_name,phase,requested_amount,approved_amount,",
    "approval_number,status,query_rounds,request_date\n"
);

impl AuthorizationExport {
    fn new(authorizations: Vec<AuthorizationSummary>) -> Self {
        Self {
            export_id: uuid::Uuid::new_v4().to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_requested: authorizations.iter().map(|a| a.requested_amount).sum(),
            total_approved: authorizations.iter().filter_map(|a| a.approved_amount).sum(),
            authorizations,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);

        for row in &self.authorizations {
            csv.push_str(&format!(
                "{},{},{},{:.2},{},{},{},{},{}\n",
                escape_csv(&row.case_id),
                escape_csv(&row.patient_name),
                row.phase,
                row.requested_amount,
                row.approved_amount.map(|a| format!("{:.2}", a)).unwrap_or_default(),
                escape_csv(row.approval_number.as_deref().unwrap_or("")),
                escape_csv(&row.status),
                row.query_rounds,
                escape_csv(&row.request_date),
            ));
        }

        csv
    }
}

/// Builds summaries from the record store.
pub struct SummaryExporter<'a> {
    store: &'a dyn AuthorizationStore,
}

impl<'a> SummaryExporter<'a> {
    pub fn new(store: &'a dyn AuthorizationStore) -> Self {
        Self { store }
    }

    /// Pre-authorization and, if present, final authorization of one case.
    pub fn export_case(&self, case_id: &str) -> StoreResult<Vec<AuthorizationSummary>> {
        let patient_name = self
            .store
            .get_case(case_id)?
            .map(|c| c.patient.display_name().to_string())
            .unwrap_or_default();

        let mut rows = Vec::new();
        if let Some(pre) = self.store.get_pre_auth(case_id)? {
            rows.push(AuthorizationSummary::from_pre_auth(&pre, &patient_name));
        }
        if let Some(final_auth) = self.store.get_final_auth(case_id)? {
            rows.push(AuthorizationSummary::from_final_auth(&final_auth, &patient_name));
        }
        Ok(rows)
    }

    /// Every case in registration order.
    pub fn export_all(&self) -> StoreResult<AuthorizationExport> {
        let mut rows = Vec::new();
        for case_id in self.store.list_case_ids()? {
            rows.extend(self.export_case(&case_id)?);
        }
        Ok(AuthorizationExport::new(rows))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
