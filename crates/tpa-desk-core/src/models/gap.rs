//! Final-bill shortfall figures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Gap share of the final bill above which the case goes to a human.
pub const ESCALATION_THRESHOLD_PCT: f64 = 20.0;

/// Gap share the desk treats as routine.
pub const ACCEPTABLE_GAP_PCT: f64 = 10.0;

/// Amount to request on top of the pre-authorization; never negative.
pub fn additional_amount(final_bill: f64, pre_auth_approved: f64) -> f64 {
    (final_bill - pre_auth_approved).max(0.0)
}

/// Gap as a percentage of the billed amount (0 for an empty bill).
pub fn gap_percentage(billed: f64, approved: f64) -> f64 {
    if billed != 0.0 {
        (billed - approved) / billed * 100.0
    } else {
        0.0
    }
}

pub fn requires_escalation(gap_percentage: f64) -> bool {
    gap_percentage > ESCALATION_THRESHOLD_PCT
}

/// Outcome of a final-authorization approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GapAnalysis {
    pub billed_amount: f64,
    pub approved_amount: f64,
    pub gap_amount: f64,
    pub gap_percentage: f64,
    /// Insurer deductions by category
    pub deductions: BTreeMap<String, f64>,
    /// Narrative from the gap analyzer
    pub analysis: String,
    pub requires_escalation: bool,
}

impl GapAnalysis {
    pub fn compute(
        billed: f64,
        approved: f64,
        deductions: BTreeMap<String, f64>,
        analysis: String,
    ) -> Self {
        let pct = gap_percentage(billed, approved);
        Self {
            billed_amount: billed,
            approved_amount: approved,
            gap_amount: billed - approved,
            gap_percentage: pct,
            deductions,
            analysis,
            requires_escalation: requires_escalation(pct),
        }
    }

    /// Gap small enough to write off without follow-up.
    pub fn is_acceptable(&self) -> bool {
        self.gap_percentage < ACCEPTABLE_GAP_PCT
    }

    /// Sum of itemised deductions.
    pub fn total_deductions(&self) -> f64 {
        self.deductions.values().sum()
    }
}
