//! Case and party models.
//!
//! A case is owned by the surrounding hospital system; the desk registers it
//! when the pre-authorization is first requested and only reads it after.

use serde::{Deserialize, Serialize};

/// Placeholder for fields the hospital system did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

pub(crate) fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Hospital identity rendered as the sender block of every letter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HospitalDetails {
    pub name: String,
    pub address: Option<String>,
    /// ROHINI registry identifier
    pub rohini_id: Option<String>,
    pub phone: Option<String>,
}

impl HospitalDetails {
    pub fn to_block(&self) -> String {
        format!(
            "Hospital:\n- Name: {}\n- Address: {}\n- ROHINI: {}\n- Phone: {}",
            or_na(Some(&self.name)),
            or_na(self.address.as_deref()),
            or_na(self.rohini_id.as_deref()),
            or_na(self.phone.as_deref()),
        )
    }
}

/// Insurer identity rendered as the recipient block of every letter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InsurerDetails {
    pub name: String,
    /// Cashless desk address (hospital-specific if one was agreed)
    pub cashless_email: Option<String>,
}

impl InsurerDetails {
    pub fn to_block(&self) -> String {
        format!(
            "Insurer:\n- Name: {}\n- Cashless Email: {}",
            or_na(Some(&self.name)),
            or_na(self.cashless_email.as_deref()),
        )
    }
}

/// Patient data supplied with the pre-authorization request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientData {
    /// Patient display name
    pub name: String,
    /// Insurance policy number
    pub policy_number: Option<String>,
    /// Treating hospital
    pub hospital: HospitalDetails,
    /// Paying insurer
    pub insurer: InsurerDetails,
}

impl PatientData {
    pub fn new(name: String, hospital: HospitalDetails, insurer: InsurerDetails) -> Self {
        Self {
            name,
            policy_number: None,
            hospital,
            insurer,
        }
    }

    /// Name as it appears in letters.
    pub fn display_name(&self) -> &str {
        or_na(Some(&self.name))
    }
}

/// A registered case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    /// External case identifier
    pub case_id: String,
    /// Patient and party data
    pub patient: PatientData,
    /// Registration timestamp
    pub registered_at: String,
}

impl CaseRecord {
    pub fn new(case_id: String, patient: PatientData) -> Self {
        Self {
            case_id,
            patient,
            registered_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
