//! Prompt templates for authorization letters and final-gap analysis.
//!
//! The generation service receives a single user message; the text below is
//! what the TPA desk has always sent, so letter tone stays stable across
//! model upgrades.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which authorization cycle a letter belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LetterPhase {
    /// Request or query reply before treatment
    PreAuthorization,
    /// Request or query reply after discharge
    FinalAuthorization,
}

impl LetterPhase {
    /// Label interpolated into the letter prompt.
    pub fn label(self) -> &'static str {
        match self {
            LetterPhase::PreAuthorization => "pre-authorization",
            LetterPhase::FinalAuthorization => "final authorization",
        }
    }
}

impl fmt::Display for LetterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured input for one letter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LetterRequest {
    /// Sender block (hospital identity)
    pub party_a: String,
    /// Recipient block (insurer identity)
    pub party_b: String,
    /// Case facts: amounts, discharge summary, query text
    pub case_block: String,
    /// Authorization cycle
    pub phase: LetterPhase,
}

/// Prompt for drafting an authorization email.
pub fn make_letter_prompt(request: &LetterRequest) -> String {
    format!(
        r#"
You are a hospital TPA desk writer. Draft a professional {} authorization email
for cashless processing. Use neutral, clinical tone and clear sections.

{}

{}

{}
"#,
        request.phase, request.party_a, request.party_b, request.case_block
    )
}

/// Prompt for analysing the shortfall between billed and approved amounts.
pub fn make_gap_prompt(billed: f64, approved: f64, deductions_json: &str) -> String {
    format!(
        r#"
Analyze final authorization result.

BILLED: ₹{}
APPROVED: ₹{}
DEDUCTIONS: {}

Return bullet points:
1) Acceptable gap? (<10% is OK)
2) Escalation? (>20% act)
3) Immediate actions
4) Expected recovery
"#,
        format_amount(billed),
        format_amount(approved),
        deductions_json
    )
}

/// Render a monetary amount with thousands separators and two decimals
/// (`60000` -> `60,000.00`).
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(phase: LetterPhase) -> LetterRequest {
        LetterRequest {
            party_a: "Hospital:\n- Name: City Care".into(),
            party_b: "Insurer:\n- Name: Star Health".into(),
            case_block: "CASE:\n- Patient: Asha Rao".into(),
            phase,
        }
    }

    #[test]
    fn test_letter_prompt_contains_blocks() {
        let prompt = make_letter_prompt(&request(LetterPhase::FinalAuthorization));
        assert!(prompt.contains("Draft a professional final authorization authorization email"));
        assert!(prompt.contains("- Name: City Care"));
        assert!(prompt.contains("- Name: Star Health"));
        assert!(prompt.contains("- Patient: Asha Rao"));
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(LetterPhase::PreAuthorization.to_string(), "pre-authorization");
        assert_eq!(LetterPhase::FinalAuthorization.to_string(), "final authorization");
    }

    #[test]
    fn test_gap_prompt() {
        let prompt = make_gap_prompt(60000.0, 50000.0, r#"{"room": 4000.0}"#);
        assert!(prompt.contains("BILLED: ₹60,000.00"));
        assert!(prompt.contains("APPROVED: ₹50,000.00"));
        assert!(prompt.contains(r#"DEDUCTIONS: {"room": 4000.0}"#));
        assert!(prompt.contains("(>20% act)"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.5), "999.50");
        assert_eq!(format_amount(1000.0), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-15000.0), "-15,000.00");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    proptest! {
        #[test]
        fn prop_format_amount_strips_to_fixed(amount in -1.0e12f64..1.0e12) {
            let formatted = format_amount(amount);
            let plain = formatted.replace(',', "");
            let expected = format!("{:.2}", amount);
            prop_assert!(plain == expected || (plain == "0.00" && expected == "-0.00"));
        }

        #[test]
        fn prop_groups_have_three_digits(amount in 0.0f64..1.0e12) {
            let formatted = format_amount(amount);
            let whole = formatted.split('.').next().unwrap();
            let groups: Vec<&str> = whole.split(',').collect();
            prop_assert!(!groups[0].is_empty() && groups[0].len() <= 3);
            for group in &groups[1..] {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
