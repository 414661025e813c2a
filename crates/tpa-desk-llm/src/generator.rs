//! Collaborator contracts for letter drafting and gap analysis.

use std::sync::Mutex;

use thiserror::Error;

use crate::prompts::{format_amount, LetterRequest};

/// Generation errors.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation service returned no content")]
    EmptyResponse,
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Drafts authorization letters and query replies.
///
/// Implementations block until the text is available. An error must be
/// returned rather than empty or placeholder text.
pub trait LetterGenerator: Send + Sync {
    fn generate_letter(&self, request: &LetterRequest) -> GenerationResult<String>;
}

/// Writes the narrative for a final-authorization shortfall.
pub trait GapAnalyzer: Send + Sync {
    fn analyze_gap(
        &self,
        billed: f64,
        approved: f64,
        deductions_json: &str,
    ) -> GenerationResult<String>;
}

/// Presentational envelope applied to every generated letter.
pub fn wrap_letter(body: &str) -> String {
    format!("<pre>{}</pre>", body)
}

/// Gap analysis request as seen by [`MockGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GapRequest {
    pub billed: f64,
    pub approved: f64,
    pub deductions_json: String,
}

/// Deterministic generator for tests and offline use.
///
/// Letters echo their inputs inside the usual envelope and every request is
/// recorded so callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct MockGenerator {
    letters: Mutex<Vec<LetterRequest>>,
    analyses: Mutex<Vec<GapRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Letter requests received so far, oldest first.
    pub fn letter_requests(&self) -> Vec<LetterRequest> {
        self.letters
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Gap analysis requests received so far, oldest first.
    pub fn gap_requests(&self) -> Vec<GapRequest> {
        self.analyses
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl LetterGenerator for MockGenerator {
    fn generate_letter(&self, request: &LetterRequest) -> GenerationResult<String> {
        if let Ok(mut calls) = self.letters.lock() {
            calls.push(request.clone());
        }

        Ok(wrap_letter(&format!(
            "Subject: {} request\n\n{}\n\n{}\n\n{}",
            request.phase,
            request.party_a,
            request.party_b,
            request.case_block.trim()
        )))
    }
}

impl GapAnalyzer for MockGenerator {
    fn analyze_gap(
        &self,
        billed: f64,
        approved: f64,
        deductions_json: &str,
    ) -> GenerationResult<String> {
        if let Ok(mut calls) = self.analyses.lock() {
            calls.push(GapRequest {
                billed,
                approved,
                deductions_json: deductions_json.to_string(),
            });
        }

        let gap = billed - approved;
        let pct = if billed != 0.0 { gap / billed * 100.0 } else { 0.0 };
        Ok(format!(
            "- Gap: ₹{} ({:.2}%)\n- Acceptable: {}\n- Escalate: {}",
            format_amount(gap),
            pct,
            if pct < 10.0 { "yes" } else { "no" },
            if pct > 20.0 { "yes" } else { "no" },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::LetterPhase;

    fn request() -> LetterRequest {
        LetterRequest {
            party_a: "Hospital:\n- Name: City Care".into(),
            party_b: "Insurer:\n- Name: Star Health".into(),
            case_block: "\nQuery:\nWhy ICU?\n".into(),
            phase: LetterPhase::PreAuthorization,
        }
    }

    #[test]
    fn test_wrap_letter() {
        assert_eq!(wrap_letter("Dear Sir"), "<pre>Dear Sir</pre>");
    }

    #[test]
    fn test_mock_letter_is_deterministic() {
        let mock = MockGenerator::new();
        let first = mock.generate_letter(&request()).unwrap();
        let second = mock.generate_letter(&request()).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("<pre>Subject: pre-authorization request"));
        assert!(first.contains("Why ICU?"));
        assert!(first.ends_with("</pre>"));
    }

    #[test]
    fn test_mock_records_requests() {
        let mock = MockGenerator::new();
        mock.generate_letter(&request()).unwrap();
        mock.analyze_gap(100.0, 70.0, "{}").unwrap();

        assert_eq!(mock.letter_requests(), vec![request()]);
        let gaps = mock.gap_requests();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].billed, 100.0);
        assert_eq!(gaps[0].approved, 70.0);
    }

    #[test]
    fn test_mock_gap_analysis() {
        let mock = MockGenerator::new();

        let small = mock.analyze_gap(100.0, 95.0, "{}").unwrap();
        assert!(small.contains("(5.00%)"));
        assert!(small.contains("Acceptable: yes"));
        assert!(small.contains("Escalate: no"));

        let large = mock.analyze_gap(60000.0, 40000.0, "{}").unwrap();
        assert!(large.contains("₹20,000.00"));
        assert!(large.contains("Escalate: yes"));

        let empty_bill = mock.analyze_gap(0.0, 0.0, "{}").unwrap();
        assert!(empty_bill.contains("(0.00%)"));
    }
}
