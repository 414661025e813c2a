//! Case database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::CaseRecord;

impl Database {
    /// Insert or update a case.
    pub fn upsert_case(&self, case: &CaseRecord) -> DbResult<()> {
        write_case(&self.conn, case)
    }

    /// Get a case by ID.
    pub fn get_case(&self, case_id: &str) -> DbResult<Option<CaseRecord>> {
        self.conn
            .query_row(
                "SELECT case_id, patient, registered_at FROM cases WHERE case_id = ?",
                [case_id],
                |row| {
                    Ok(CaseRow {
                        case_id: row.get(0)?,
                        patient: row.get(1)?,
                        registered_at: row.get(2)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

/// Upsert a case on any connection, including an open transaction.
pub(super) fn write_case(conn: &Connection, case: &CaseRecord) -> DbResult<()> {
    let patient_json = serde_json::to_string(&case.patient)?;

    conn.execute(
        r#"
        INSERT INTO cases (case_id, patient, registered_at, updated_at)
        VALUES (?1, ?2, ?3, datetime('now'))
        ON CONFLICT(case_id) DO UPDATE SET
            patient = excluded.patient,
            registered_at = excluded.registered_at,
            updated_at = datetime('now')
        "#,
        params![case.case_id, patient_json, case.registered_at],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct CaseRow {
    case_id: String,
    patient: String,
    registered_at: String,
}

impl TryFrom<CaseRow> for CaseRecord {
    type Error = DbError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        Ok(CaseRecord {
            case_id: row.case_id,
            patient: serde_json::from_str(&row.patient)?,
            registered_at: row.registered_at,
        })
    }
}
