//! Authorization status shared by both phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a pre- or final-authorization stands with the insurer.
///
/// ```text
/// Pending ──► QueryReplied ──► QueryReplied ...
///    │              │
///    └──────┬───────┘
///           ▼
///   Approved | PartiallyApproved | Rejected   (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    /// Request sent, no insurer response yet
    Pending,
    /// Insurer raised a query that has not been answered
    #[serde(rename = "Query Raised")]
    QueryRaised,
    /// Latest insurer query has been answered
    #[serde(rename = "Query Replied")]
    QueryReplied,
    /// Approved in full
    Approved,
    /// Declined by the insurer
    Rejected,
    /// Approved for less than the full request
    #[serde(rename = "Partially Approved")]
    PartiallyApproved,
}

impl AuthorizationStatus {
    /// No operation moves a record out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Approved
                | AuthorizationStatus::Rejected
                | AuthorizationStatus::PartiallyApproved
        )
    }

    /// Statuses that carry an approved amount.
    pub fn carries_approval(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Approved | AuthorizationStatus::PartiallyApproved
        )
    }

    /// Display label used in letters and exports.
    pub fn label(self) -> &'static str {
        match self {
            AuthorizationStatus::Pending => "Pending",
            AuthorizationStatus::QueryRaised => "Query Raised",
            AuthorizationStatus::QueryReplied => "Query Replied",
            AuthorizationStatus::Approved => "Approved",
            AuthorizationStatus::Rejected => "Rejected",
            AuthorizationStatus::PartiallyApproved => "Partially Approved",
        }
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
