//! Pre- and final-authorization trackers.
//!
//! Each operation locks its case, loads the records it needs, calls the
//! letter collaborator if required and only then writes the changed record
//! back. A collaborator failure therefore leaves the store untouched.

mod blocks;
mod final_auth;
mod pre_auth;

pub use blocks::*;
pub use final_auth::{FinalAuthRequest, FinalAuthTracker};
pub use pre_auth::PreAuthTracker;

use std::collections::HashSet;
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};

use thiserror::Error;
use tpa_desk_llm::GenerationError;

use crate::models::{AuthorizationStatus, TerminalStatus};
use crate::store::StoreError;

/// Kind of record an operation needed but could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Case,
    PreAuthorization,
    FinalAuthorization,
    Discharge,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordKind::Case => "case",
            RecordKind::PreAuthorization => "pre-authorization",
            RecordKind::FinalAuthorization => "final authorization",
            RecordKind::Discharge => "discharge record",
        })
    }
}

/// Tracker errors.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("No {record} found for case {case_id}")]
    NotFound { record: RecordKind, case_id: String },

    #[error("Pre-authorization already exists for case {0}")]
    DuplicateCase(String),

    #[error("Letter generation failed: {0}")]
    Collaborator(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("Case {case_id} is already {status}")]
    InvalidTransition {
        case_id: String,
        status: AuthorizationStatus,
    },

    #[error("Invalid approval date: {0}")]
    InvalidDate(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl TrackerError {
    pub(crate) fn not_found(record: RecordKind, case_id: &str) -> Self {
        TrackerError::NotFound {
            record,
            case_id: case_id.to_string(),
        }
    }

    pub(crate) fn terminal(case_id: &str, err: TerminalStatus) -> Self {
        TrackerError::InvalidTransition {
            case_id: case_id.to_string(),
            status: err.0,
        }
    }
}

impl<T> From<PoisonError<T>> for TrackerError {
    fn from(e: PoisonError<T>) -> Self {
        TrackerError::Lock(e.to_string())
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Reject negative, infinite and NaN amounts.
pub(crate) fn check_amount(field: &'static str, value: f64) -> TrackerResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TrackerError::InvalidAmount { field, value })
    }
}

/// Exclusive access per case identifier.
///
/// A tracker operation holds its case from the first read until the record is
/// written back, so two operations on the same case never interleave.
/// Different cases never contend. Only cases currently held have an entry.
#[derive(Debug, Default)]
pub struct CaseLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl CaseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `case_id` is free, then hold it until the guard drops.
    pub fn lock(&self, case_id: &str) -> TrackerResult<CaseGuard<'_>> {
        let mut held = self.held.lock()?;
        while held.contains(case_id) {
            held = self.released.wait(held)?;
        }
        held.insert(case_id.to_string());
        Ok(CaseGuard {
            locks: self,
            case_id: case_id.to_string(),
        })
    }

    /// Number of cases currently held.
    pub fn len(&self) -> usize {
        self.held.lock().map(|held| held.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its case on drop.
#[derive(Debug)]
pub struct CaseGuard<'a> {
    locks: &'a CaseLocks,
    case_id: String,
}

impl Drop for CaseGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.case_id);
        self.locks.released.notify_all();
    }
}
