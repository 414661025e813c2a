//! TPA Desk Core Library
//!
//! Cashless authorization tracking for a hospital TPA desk: the
//! pre-authorization cycle before treatment and the final-authorization
//! cycle after discharge.
//!
//! # Architecture
//!
//! ```text
//!   Admission → PreAuthTracker.create_request ── Pending
//!                         │
//!            insurer query │ record_query  (LetterGenerator)
//!                         ▼
//!                   Query Replied ◄──┐ repeated rounds
//!                         │ ─────────┘
//!                         ▼
//!        Approved / Partially Approved / Rejected   (terminal)
//!                         │
//!   Discharge → FinalAuthTracker.create_request
//!                         │  additional = max(0, bill − pre-auth approved)
//!                         ▼
//!           query rounds (LetterGenerator), then
//!           record_approval ──► GapAnalysis (GapAnalyzer)
//!                                  gap % > 20 ⇒ escalate
//! ```
//!
//! # Modules
//!
//! - [`models`]: Records, status machine, gap arithmetic
//! - [`tracker`]: Pre- and final-authorization trackers, per-case locking
//! - [`store`]: Record store trait with in-memory and SQLite back ends
//! - [`db`]: SQLite schema and row mapping
//! - [`export`]: Authorization summaries as JSON or CSV
//! - [`settings`]: Environment configuration

pub mod db;
pub mod export;
pub mod models;
pub mod settings;
pub mod store;
pub mod tracker;

// Re-export commonly used types
pub use db::Database;
pub use export::{AuthorizationExport, AuthorizationSummary, SummaryExporter};
pub use models::{
    ApprovalDetails, AuthorizationStatus, BillBreakdown, CaseRecord, DischargeData,
    DischargeRecord, FinalAuthorizationRecord, GapAnalysis, HospitalDetails, InsurerDetails,
    PatientData, PreAuthorizationRecord,
};
pub use settings::DeskConfig;
pub use store::{open_store, AuthorizationStore, MemoryStore, SqliteStore, StoreError};
pub use tracker::{
    CaseLocks, FinalAuthRequest, FinalAuthTracker, PreAuthTracker, RecordKind, TrackerError,
    TrackerResult,
};

use std::sync::Arc;

use tpa_desk_llm::{GapAnalyzer, LetterGenerator};

/// A desk instance: one record store, the text collaborators and the
/// per-case lock table shared by every tracker it hands out.
pub struct TpaDesk {
    store: Box<dyn AuthorizationStore>,
    letters: Arc<dyn LetterGenerator>,
    gaps: Arc<dyn GapAnalyzer>,
    locks: CaseLocks,
}

impl TpaDesk {
    /// Desk whose letters and gap analyses come from the same service.
    pub fn new<G>(store: Box<dyn AuthorizationStore>, generator: Arc<G>) -> Self
    where
        G: LetterGenerator + GapAnalyzer + 'static,
    {
        let letters: Arc<dyn LetterGenerator> = generator.clone();
        let gaps: Arc<dyn GapAnalyzer> = generator;
        Self::from_parts(store, letters, gaps)
    }

    pub fn from_parts(
        store: Box<dyn AuthorizationStore>,
        letters: Arc<dyn LetterGenerator>,
        gaps: Arc<dyn GapAnalyzer>,
    ) -> Self {
        Self {
            store,
            letters,
            gaps,
            locks: CaseLocks::new(),
        }
    }

    /// Open the store named by `config`.
    pub fn open<G>(config: &DeskConfig, generator: Arc<G>) -> TrackerResult<Self>
    where
        G: LetterGenerator + GapAnalyzer + 'static,
    {
        let store = open_store(config)?;
        Ok(Self::new(store, generator))
    }

    pub fn pre_auth(&self) -> PreAuthTracker<'_> {
        PreAuthTracker::new(self.store.as_ref(), self.letters.as_ref(), &self.locks)
    }

    pub fn final_auth(&self) -> FinalAuthTracker<'_> {
        FinalAuthTracker::new(
            self.store.as_ref(),
            self.letters.as_ref(),
            self.gaps.as_ref(),
            &self.locks,
        )
    }

    pub fn exporter(&self) -> SummaryExporter<'_> {
        SummaryExporter::new(self.store.as_ref())
    }

    pub fn store(&self) -> &dyn AuthorizationStore {
        self.store.as_ref()
    }
}
