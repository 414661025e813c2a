//! Status machine shared by pre- and final-authorization records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::AuthorizationStatus;

/// A mutation was attempted on a record that already reached a terminal status.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("authorization is already {0}")]
pub struct TerminalStatus(pub AuthorizationStatus);

/// One insurer query and the reply sent back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryEntry {
    /// When the reply was recorded (RFC 3339)
    pub timestamp: String,
    /// Query text as received from the insurer
    pub query: String,
    /// Reply text as generated
    pub response: String,
}

/// Insurer approval as communicated to the hospital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalDetails {
    pub approved_amount: f64,
    pub approval_number: String,
    pub approval_date: NaiveDateTime,
}

impl ApprovalDetails {
    pub fn new(
        approved_amount: f64,
        approval_number: String,
        approval_date: NaiveDateTime,
    ) -> Self {
        Self {
            approved_amount,
            approval_number,
            approval_date,
        }
    }
}

/// Parse an insurer approval date.
///
/// Accepts `2024-01-15`, `2024-01-15T10:30:00` and RFC 3339 with an offset
/// (normalised to UTC).
pub fn parse_approval_date(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let value = value.trim();
    value
        .parse::<NaiveDateTime>()
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_utc()))
        .or_else(|_| value.parse::<NaiveDate>().map(|d| d.and_time(NaiveTime::MIN)))
}

/// Status, queries and decision fields of one authorization.
///
/// `approval` is present exactly when the status carries an approval, and
/// `queries` only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationLifecycle {
    pub status: AuthorizationStatus,
    pub approval: Option<ApprovalDetails>,
    pub queries: Vec<QueryEntry>,
    pub rejection_reason: Option<String>,
}

impl Default for AuthorizationLifecycle {
    fn default() -> Self {
        Self {
            status: AuthorizationStatus::Pending,
            approval: None,
            queries: Vec::new(),
            rejection_reason: None,
        }
    }
}

impl AuthorizationLifecycle {
    /// Fails if no further transitions are allowed.
    pub fn ensure_open(&self) -> Result<(), TerminalStatus> {
        if self.status.is_terminal() {
            Err(TerminalStatus(self.status))
        } else {
            Ok(())
        }
    }

    /// Append a query/reply round and mark the query answered.
    pub fn record_query_reply(
        &mut self,
        query: String,
        response: String,
    ) -> Result<(), TerminalStatus> {
        self.ensure_open()?;
        self.queries.push(QueryEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            query,
            response,
        });
        self.status = AuthorizationStatus::QueryReplied;
        Ok(())
    }

    pub fn approve(&mut self, approval: ApprovalDetails) -> Result<(), TerminalStatus> {
        self.decide(AuthorizationStatus::Approved, approval)
    }

    pub fn approve_partially(&mut self, approval: ApprovalDetails) -> Result<(), TerminalStatus> {
        self.decide(AuthorizationStatus::PartiallyApproved, approval)
    }

    pub fn reject(&mut self, reason: String) -> Result<(), TerminalStatus> {
        self.ensure_open()?;
        self.status = AuthorizationStatus::Rejected;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    pub fn approved_amount(&self) -> Option<f64> {
        self.approval.as_ref().map(|a| a.approved_amount)
    }

    fn decide(
        &mut self,
        status: AuthorizationStatus,
        approval: ApprovalDetails,
    ) -> Result<(), TerminalStatus> {
        self.ensure_open()?;
        self.status = status;
        self.approval = Some(approval);
        Ok(())
    }
}
