//! Pre- and final-authorization database operations.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{
    ApprovalDetails, AuthorizationLifecycle, AuthorizationStatus, FinalAuthorizationRecord,
    PreAuthorizationRecord, QueryEntry,
};

const APPROVAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl Database {
    /// Insert or replace the pre-authorization for a case.
    pub fn upsert_pre_auth(&self, record: &PreAuthorizationRecord) -> DbResult<()> {
        write_pre_auth(&self.conn, record)
    }

    /// Get the pre-authorization for a case.
    pub fn get_pre_auth(&self, case_id: &str) -> DbResult<Option<PreAuthorizationRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT case_id, request_date, requested_amount, status,
                       approved_amount, approval_number, approval_date,
                       queries, rejection_reason
                FROM pre_authorizations
                WHERE case_id = ?
                "#,
                [case_id],
                |row| {
                    Ok(PreAuthRow {
                        case_id: row.get(0)?,
                        request_date: row.get(1)?,
                        requested_amount: row.get(2)?,
                        lifecycle: LifecycleColumns {
                            status: row.get(3)?,
                            approved_amount: row.get(4)?,
                            approval_number: row.get(5)?,
                            approval_date: row.get(6)?,
                            queries: row.get(7)?,
                            rejection_reason: row.get(8)?,
                        },
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Insert or replace the final authorization for a case.
    pub fn upsert_final_auth(&self, record: &FinalAuthorizationRecord) -> DbResult<()> {
        write_final_auth(&self.conn, record)
    }

    /// Get the final authorization for a case.
    pub fn get_final_auth(&self, case_id: &str) -> DbResult<Option<FinalAuthorizationRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT case_id, request_date, final_bill_amount, pre_auth_approved,
                       additional_amount_requested, status, approved_amount,
                       approval_number, approval_date, queries, deductions,
                       documents_submitted, rejection_reason
                FROM final_authorizations
                WHERE case_id = ?
                "#,
                [case_id],
                |row| {
                    Ok(FinalAuthRow {
                        case_id: row.get(0)?,
                        request_date: row.get(1)?,
                        final_bill_amount: row.get(2)?,
                        pre_auth_approved: row.get(3)?,
                        additional_amount_requested: row.get(4)?,
                        lifecycle: LifecycleColumns {
                            status: row.get(5)?,
                            approved_amount: row.get(6)?,
                            approval_number: row.get(7)?,
                            approval_date: row.get(8)?,
                            queries: row.get(9)?,
                            rejection_reason: row.get(12)?,
                        },
                        deductions: row.get(10)?,
                        documents_submitted: row.get(11)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

pub(super) fn write_pre_auth(conn: &Connection, record: &PreAuthorizationRecord) -> DbResult<()> {
    let lc = LifecycleColumns::from_lifecycle(&record.lifecycle)?;

    conn.execute(
        r#"
        INSERT INTO pre_authorizations (
            case_id, request_date, requested_amount, status,
            approved_amount, approval_number, approval_date,
            queries, rejection_reason, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, datetime('now'))
        ON CONFLICT(case_id) DO UPDATE SET
            request_date = excluded.request_date,
            requested_amount = excluded.requested_amount,
            status = excluded.status,
            approved_amount = excluded.approved_amount,
            approval_number = excluded.approval_number,
            approval_date = excluded.approval_date,
            queries = excluded.queries,
            rejection_reason = excluded.rejection_reason,
            updated_at = datetime('now')
        "#,
        params![
            record.case_id,
            record.request_date,
            record.requested_amount,
            lc.status,
            lc.approved_amount,
            lc.approval_number,
            lc.approval_date,
            lc.queries,
            lc.rejection_reason,
        ],
    )?;
    Ok(())
}

pub(super) fn write_final_auth(
    conn: &Connection,
    record: &FinalAuthorizationRecord,
) -> DbResult<()> {
    let lc = LifecycleColumns::from_lifecycle(&record.lifecycle)?;
    let deductions_json = serde_json::to_string(&record.deductions)?;
    let documents_json = serde_json::to_string(&record.documents_submitted)?;

    conn.execute(
        r#"
        INSERT INTO final_authorizations (
            case_id, request_date, final_bill_amount, pre_auth_approved,
            additional_amount_requested, status, approved_amount,
            approval_number, approval_date, queries, deductions,
            documents_submitted, rejection_reason, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, datetime('now'))
        ON CONFLICT(case_id) DO UPDATE SET
            request_date = excluded.request_date,
            final_bill_amount = excluded.final_bill_amount,
            pre_auth_approved = excluded.pre_auth_approved,
            additional_amount_requested = excluded.additional_amount_requested,
            status = excluded.status,
            approved_amount = excluded.approved_amount,
            approval_number = excluded.approval_number,
            approval_date = excluded.approval_date,
            queries = excluded.queries,
            deductions = excluded.deductions,
            documents_submitted = excluded.documents_submitted,
            rejection_reason = excluded.rejection_reason,
            updated_at = datetime('now')
        "#,
        params![
            record.case_id,
            record.request_date,
            record.final_bill_amount,
            record.pre_auth_approved,
            record.additional_amount_requested,
            lc.status,
            lc.approved_amount,
            lc.approval_number,
            lc.approval_date,
            lc.queries,
            deductions_json,
            documents_json,
            lc.rejection_reason,
        ],
    )?;
    Ok(())
}

/// Status, approval and query columns shared by both tables.
struct LifecycleColumns {
    status: String,
    approved_amount: Option<f64>,
    approval_number: Option<String>,
    approval_date: Option<String>,
    queries: String,
    rejection_reason: Option<String>,
}

impl LifecycleColumns {
    fn from_lifecycle(lifecycle: &AuthorizationLifecycle) -> DbResult<Self> {
        let approval = lifecycle.approval.as_ref();
        Ok(Self {
            status: status_to_string(&lifecycle.status).to_string(),
            approved_amount: approval.map(|a| a.approved_amount),
            approval_number: approval.map(|a| a.approval_number.clone()),
            approval_date: approval
                .map(|a| a.approval_date.format(APPROVAL_DATE_FORMAT).to_string()),
            queries: serde_json::to_string(&lifecycle.queries)?,
            rejection_reason: lifecycle.rejection_reason.clone(),
        })
    }

    fn into_lifecycle(self) -> DbResult<AuthorizationLifecycle> {
        let status = string_to_status(&self.status)?;
        let queries: Vec<QueryEntry> = serde_json::from_str(&self.queries)?;

        let approval = match (self.approved_amount, self.approval_number, self.approval_date) {
            (Some(amount), Some(number), Some(date)) => {
                let approval_date = date.parse::<NaiveDateTime>().map_err(|e| {
                    DbError::Constraint(format!("Invalid approval date {}: {}", date, e))
                })?;
                Some(ApprovalDetails::new(amount, number, approval_date))
            }
            (None, None, None) => None,
            _ => {
                return Err(DbError::Constraint(
                    "Approval columns must be set together".into(),
                ))
            }
        };

        if approval.is_some() != status.carries_approval() {
            return Err(DbError::Constraint(format!(
                "Approval fields do not match status {}",
                status
            )));
        }

        Ok(AuthorizationLifecycle {
            status,
            approval,
            queries,
            rejection_reason: self.rejection_reason,
        })
    }
}

/// Intermediate row struct for database mapping.
struct PreAuthRow {
    case_id: String,
    request_date: String,
    requested_amount: f64,
    lifecycle: LifecycleColumns,
}

impl TryFrom<PreAuthRow> for PreAuthorizationRecord {
    type Error = DbError;

    fn try_from(row: PreAuthRow) -> Result<Self, Self::Error> {
        Ok(PreAuthorizationRecord {
            case_id: row.case_id,
            request_date: row.request_date,
            requested_amount: row.requested_amount,
            lifecycle: row.lifecycle.into_lifecycle()?,
        })
    }
}

/// Intermediate row struct for database mapping.
struct FinalAuthRow {
    case_id: String,
    request_date: String,
    final_bill_amount: f64,
    pre_auth_approved: f64,
    additional_amount_requested: f64,
    lifecycle: LifecycleColumns,
    deductions: String,
    documents_submitted: String,
}

impl TryFrom<FinalAuthRow> for FinalAuthorizationRecord {
    type Error = DbError;

    fn try_from(row: FinalAuthRow) -> Result<Self, Self::Error> {
        let deductions: BTreeMap<String, f64> = serde_json::from_str(&row.deductions)?;
        let documents_submitted: Vec<String> = serde_json::from_str(&row.documents_submitted)?;

        Ok(FinalAuthorizationRecord {
            case_id: row.case_id,
            request_date: row.request_date,
            final_bill_amount: row.final_bill_amount,
            pre_auth_approved: row.pre_auth_approved,
            additional_amount_requested: row.additional_amount_requested,
            lifecycle: row.lifecycle.into_lifecycle()?,
            deductions,
            documents_submitted,
        })
    }
}

fn status_to_string(status: &AuthorizationStatus) -> &'static str {
    match status {
        AuthorizationStatus::Pending => "pending",
        AuthorizationStatus::QueryRaised => "query_raised",
        AuthorizationStatus::QueryReplied => "query_replied",
        AuthorizationStatus::Approved => "approved",
        AuthorizationStatus::Rejected => "rejected",
        AuthorizationStatus::PartiallyApproved => "partially_approved",
    }
}

fn string_to_status(s: &str) -> Result<AuthorizationStatus, DbError> {
    match s {
        "pending" => Ok(AuthorizationStatus::Pending),
        "query_raised" => Ok(AuthorizationStatus::QueryRaised),
        "query_replied" => Ok(AuthorizationStatus::QueryReplied),
        "approved" => Ok(AuthorizationStatus::Approved),
        "rejected" => Ok(AuthorizationStatus::Rejected),
        "partially_approved" => Ok(AuthorizationStatus::PartiallyApproved),
        _ => Err(DbError::Constraint(format!("Unknown authorization status: {}", s))),
    }
}
