//! Pre-authorization and final-authorization records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::gap::additional_amount;
use super::lifecycle::{ApprovalDetails, AuthorizationLifecycle, TerminalStatus};
use super::status::AuthorizationStatus;

/// Supporting documents sent with every final-authorization request.
pub const FINAL_AUTH_DOCUMENTS: [&str; 6] = [
    "Discharge Summary",
    "Final Bill (itemized)",
    "Investigation Reports",
    "Pharmacy Bills",
    "OT Notes",
    "IPD Charts",
];

/// Pre-treatment authorization for one case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreAuthorizationRecord {
    /// External case identifier
    pub case_id: String,
    /// Creation timestamp
    pub request_date: String,
    /// Estimated cost submitted with the request
    pub requested_amount: f64,
    #[serde(flatten)]
    pub lifecycle: AuthorizationLifecycle,
}

impl PreAuthorizationRecord {
    pub fn new(case_id: String, requested_amount: f64) -> Self {
        Self {
            case_id,
            request_date: chrono::Utc::now().to_rfc3339(),
            requested_amount,
            lifecycle: AuthorizationLifecycle::default(),
        }
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.lifecycle.status
    }

    pub fn approved_amount(&self) -> Option<f64> {
        self.lifecycle.approved_amount()
    }

    pub fn approval_number(&self) -> Option<&str> {
        self.lifecycle
            .approval
            .as_ref()
            .map(|a| a.approval_number.as_str())
    }
}

/// Post-discharge authorization reconciling the final bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalAuthorizationRecord {
    /// Same identifier as the pre-authorization
    pub case_id: String,
    /// Creation timestamp
    pub request_date: String,
    pub final_bill_amount: f64,
    /// Pre-authorization approved amount at creation time (0 if none)
    pub pre_auth_approved: f64,
    pub additional_amount_requested: f64,
    #[serde(flatten)]
    pub lifecycle: AuthorizationLifecycle,
    /// Insurer deductions by category, set at approval
    pub deductions: BTreeMap<String, f64>,
    pub documents_submitted: Vec<String>,
}

impl FinalAuthorizationRecord {
    /// Create a pending record; the pre-authorization amount is copied, not linked.
    pub fn new(case_id: String, final_bill_amount: f64, pre_auth_approved: f64) -> Self {
        Self {
            case_id,
            request_date: chrono::Utc::now().to_rfc3339(),
            final_bill_amount,
            pre_auth_approved,
            additional_amount_requested: additional_amount(final_bill_amount, pre_auth_approved),
            lifecycle: AuthorizationLifecycle::default(),
            deductions: BTreeMap::new(),
            documents_submitted: FINAL_AUTH_DOCUMENTS.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn status(&self) -> AuthorizationStatus {
        self.lifecycle.status
    }

    pub fn approved_amount(&self) -> Option<f64> {
        self.lifecycle.approved_amount()
    }

    /// Record approval together with the insurer's deductions.
    pub fn approve(
        &mut self,
        approval: ApprovalDetails,
        deductions: BTreeMap<String, f64>,
    ) -> Result<(), TerminalStatus> {
        self.lifecycle.approve(approval)?;
        self.deductions = deductions;
        Ok(())
    }
}
