//! SQLite schema definition.

/// Complete database schema for the TPA desk.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Cases
-- ============================================================================

CREATE TABLE IF NOT EXISTS cases (
    case_id TEXT PRIMARY KEY,
    patient TEXT NOT NULL,                        -- JSON PatientData
    registered_at TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Pre-Authorizations (one per case)
-- ============================================================================

CREATE TABLE IF NOT EXISTS pre_authorizations (
    case_id TEXT PRIMARY KEY REFERENCES cases(case_id),
    request_date TEXT NOT NULL,
    requested_amount REAL NOT NULL CHECK (requested_amount >= 0),
    status TEXT NOT NULL DEFAULT 'pending',      -- pending, query_raised, query_replied, approved, rejected, partially_approved
    approved_amount REAL,
    approval_number TEXT,
    approval_date TEXT,
    queries TEXT NOT NULL DEFAULT '[]',           -- JSON array of QueryEntry
    rejection_reason TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((approved_amount IS NOT NULL) = (status IN ('approved', 'partially_approved')))
);

CREATE INDEX IF NOT EXISTS idx_pre_auth_status ON pre_authorizations(status);

-- ============================================================================
-- Final Authorizations (zero or one per case, after pre-authorization)
-- ============================================================================

CREATE TABLE IF NOT EXISTS final_authorizations (
    case_id TEXT PRIMARY KEY REFERENCES pre_authorizations(case_id),
    request_date TEXT NOT NULL,
    final_bill_amount REAL NOT NULL CHECK (final_bill_amount >= 0),
    pre_auth_approved REAL NOT NULL,
    additional_amount_requested REAL NOT NULL CHECK (additional_amount_requested >= 0),
    status TEXT NOT NULL DEFAULT 'pending',
    approved_amount REAL,
    approval_number TEXT,
    approval_date TEXT,
    queries TEXT NOT NULL DEFAULT '[]',           -- JSON array of QueryEntry
    deductions TEXT NOT NULL DEFAULT '{}',        -- JSON object {category: amount}
    documents_submitted TEXT NOT NULL DEFAULT '[]',
    rejection_reason TEXT,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((approved_amount IS NOT NULL) = (status IN ('approved', 'partially_approved')))
);

CREATE INDEX IF NOT EXISTS idx_final_auth_status ON final_authorizations(status);

-- ============================================================================
-- Discharge Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS discharge_records (
    case_id TEXT PRIMARY KEY REFERENCES cases(case_id),
    recorded_at TEXT NOT NULL,
    final_bill_amount REAL NOT NULL,
    admission_date TEXT,
    discharge_date TEXT,
    final_diagnosis TEXT,
    procedures TEXT NOT NULL DEFAULT '[]',        -- JSON array of strings
    length_of_stay_days INTEGER NOT NULL DEFAULT 0,
    complications TEXT,
    charges TEXT NOT NULL DEFAULT '{}'            -- JSON BillBreakdown
);
"#;
