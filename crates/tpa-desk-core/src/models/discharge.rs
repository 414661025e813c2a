//! Discharge summary and itemised bill.

use serde::{Deserialize, Serialize};

/// Itemised charges on the final bill.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillBreakdown {
    #[serde(default)]
    pub room_charges: f64,
    #[serde(default)]
    pub surgery_charges: f64,
    #[serde(default)]
    pub pharmacy_charges: f64,
    #[serde(default)]
    pub investigation_charges: f64,
    #[serde(default)]
    pub doctor_fees: f64,
    #[serde(default)]
    pub other_charges: f64,
}

impl BillBreakdown {
    /// Labelled lines in bill order.
    pub fn lines(&self) -> [(&'static str, f64); 6] {
        [
            ("Room", self.room_charges),
            ("Surgery", self.surgery_charges),
            ("Pharmacy", self.pharmacy_charges),
            ("Investigations", self.investigation_charges),
            ("Doctor Fees", self.doctor_fees),
            ("Others", self.other_charges),
        ]
    }

    pub fn total(&self) -> f64 {
        self.lines().iter().map(|(_, amount)| amount).sum()
    }
}

/// Clinical and billing data captured at discharge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DischargeData {
    /// Billed total submitted to the insurer
    pub final_bill_amount: f64,
    pub admission_date: Option<String>,
    pub discharge_date: Option<String>,
    pub final_diagnosis: Option<String>,
    #[serde(default)]
    pub procedures: Vec<String>,
    /// Length of stay in days
    #[serde(default)]
    pub length_of_stay_days: u32,
    pub complications: Option<String>,
    #[serde(default)]
    pub charges: BillBreakdown,
}

/// Discharge data as stored for a case. Never changed after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DischargeRecord {
    pub case_id: String,
    /// When the final authorization request was made
    pub recorded_at: String,
    #[serde(flatten)]
    pub data: DischargeData,
}

impl DischargeRecord {
    pub fn new(case_id: String, data: DischargeData) -> Self {
        Self {
            case_id,
            recorded_at: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    /// Procedures as a single comma-separated line.
    pub fn procedures_line(&self) -> String {
        self.data.procedures.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakdown_total() {
        let charges = BillBreakdown {
            room_charges: 12000.0,
            surgery_charges: 30000.0,
            pharmacy_charges: 8000.0,
            investigation_charges: 5000.0,
            doctor_fees: 4000.0,
            other_charges: 1000.0,
        };
        assert_eq!(charges.total(), 60000.0);
        assert_eq!(charges.lines()[3], ("Investigations", 5000.0));
    }

    #[test]
    fn test_deserialize_sparse_discharge() {
        let data: DischargeData =
            serde_json::from_str(r#"{"final_bill_amount": 60000.0}"#).unwrap();
        assert_eq!(data.final_bill_amount, 60000.0);
        assert!(data.procedures.is_empty());
        assert_eq!(data.length_of_stay_days, 0);
        assert_eq!(data.charges, BillBreakdown::default());
    }

    #[test]
    fn test_record_flattens_data() {
        let record = DischargeRecord::new(
            "C1".into(),
            DischargeData {
                final_bill_amount: 100.0,
                procedures: vec!["Appendectomy".into(), "Drain removal".into()],
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["case_id"], "C1");
        assert_eq!(json["final_bill_amount"], 100.0);
        assert_eq!(record.procedures_line(), "Appendectomy, Drain removal");
    }
}
