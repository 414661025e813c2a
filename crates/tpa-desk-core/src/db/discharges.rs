//! Discharge record database operations.

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{DischargeData, DischargeRecord};

impl Database {
    /// Insert or replace the discharge record for a case.
    pub fn upsert_discharge(&self, record: &DischargeRecord) -> DbResult<()> {
        write_discharge(&self.conn, record)
    }

    /// Get the discharge record for a case.
    pub fn get_discharge(&self, case_id: &str) -> DbResult<Option<DischargeRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT case_id, recorded_at, final_bill_amount, admission_date,
                       discharge_date, final_diagnosis, procedures,
                       length_of_stay_days, complications, charges
                FROM discharge_records
                WHERE case_id = ?
                "#,
                [case_id],
                |row| {
                    Ok(DischargeRow {
                        case_id: row.get(0)?,
                        recorded_at: row.get(1)?,
                        final_bill_amount: row.get(2)?,
                        admission_date: row.get(3)?,
                        discharge_date: row.get(4)?,
                        final_diagnosis: row.get(5)?,
                        procedures: row.get(6)?,
                        length_of_stay_days: row.get(7)?,
                        complications: row.get(8)?,
                        charges: row.get(9)?,
                    })
                },
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }
}

/// Upsert a discharge record on any connection, including an open transaction.
pub(super) fn write_discharge(conn: &Connection, record: &DischargeRecord) -> DbResult<()> {
    let data = &record.data;
    let procedures_json = serde_json::to_string(&data.procedures)?;
    let charges_json = serde_json::to_string(&data.charges)?;

    conn.execute(
        r#"
        INSERT INTO discharge_records (
            case_id, recorded_at, final_bill_amount, admission_date,
            discharge_date, final_diagnosis, procedures,
            length_of_stay_days, complications, charges
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(case_id) DO UPDATE SET
            recorded_at = excluded.recorded_at,
            final_bill_amount = excluded.final_bill_amount,
            admission_date = excluded.admission_date,
            discharge_date = excluded.discharge_date,
            final_diagnosis = excluded.final_diagnosis,
            procedures = excluded.procedures,
            length_of_stay_days = excluded.length_of_stay_days,
            complications = excluded.complications,
            charges = excluded.charges
        "#,
        params![
            record.case_id,
            record.recorded_at,
            data.final_bill_amount,
            data.admission_date,
            data.discharge_date,
            data.final_diagnosis,
            procedures_json,
            data.length_of_stay_days,
            data.complications,
            charges_json,
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct DischargeRow {
    case_id: String,
    recorded_at: String,
    final_bill_amount: f64,
    admission_date: Option<String>,
    discharge_date: Option<String>,
    final_diagnosis: Option<String>,
    procedures: String,
    length_of_stay_days: u32,
    complications: Option<String>,
    charges: String,
}

impl TryFrom<DischargeRow> for DischargeRecord {
    type Error = DbError;

    fn try_from(row: DischargeRow) -> Result<Self, Self::Error> {
        Ok(DischargeRecord {
            case_id: row.case_id,
            recorded_at: row.recorded_at,
            data: DischargeData {
                final_bill_amount: row.final_bill_amount,
                admission_date: row.admission_date,
                discharge_date: row.discharge_date,
                final_diagnosis: row.final_diagnosis,
                procedures: serde_json::from_str(&row.procedures)?,
                length_of_stay_days: row.length_of_stay_days,
                complications: row.complications,
                charges: serde_json::from_str(&row.charges)?,
            },
        })
    }
}
