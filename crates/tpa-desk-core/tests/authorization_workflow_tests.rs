//! End-to-end tests for the two-phase authorization workflow.

use std::collections::BTreeMap;
use std::sync::{Arc, Once};
use std::thread;

use tpa_desk_core::models::AuthorizationStatus;
use tpa_desk_core::{
    BillBreakdown, DeskConfig, DischargeData, HospitalDetails, InsurerDetails, MemoryStore,
    PatientData, RecordKind, SqliteStore, TpaDesk, TrackerError,
};
use tpa_desk_llm::{
    GapAnalyzer, GenerationError, GenerationResult, LetterGenerator, LetterRequest, MockGenerator,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn memory_desk() -> TpaDesk {
    init_tracing();
    TpaDesk::new(Box::new(MemoryStore::new()), Arc::new(MockGenerator::new()))
}

fn patient(name: &str) -> PatientData {
    let mut patient = PatientData::new(
        name.into(),
        HospitalDetails {
            name: "City Care Hospital".into(),
            address: Some("12 MG Road, Pune".into()),
            rohini_id: Some("8900080123456".into()),
            phone: Some("+91 20 5555 0100".into()),
        },
        InsurerDetails {
            name: "Star Health".into(),
            cashless_email: Some("cashless@star.example".into()),
        },
    );
    patient.policy_number = Some("POL-991".into());
    patient
}

fn discharge(final_bill: f64) -> DischargeData {
    DischargeData {
        final_bill_amount: final_bill,
        admission_date: Some("2024-01-10".into()),
        discharge_date: Some("2024-01-14".into()),
        final_diagnosis: Some("Acute appendicitis".into()),
        procedures: vec!["Laparoscopic appendectomy".into()],
        length_of_stay_days: 4,
        complications: None,
        charges: BillBreakdown {
            room_charges: 12000.0,
            surgery_charges: 35000.0,
            pharmacy_charges: 8000.0,
            investigation_charges: 3000.0,
            doctor_fees: 2000.0,
            other_charges: final_bill - 60000.0,
        },
    }
}

/// 50,000 requested, 45,000 approved, discharged with the given bill.
fn approved_case(desk: &TpaDesk, case_id: &str, final_bill: f64) -> anyhow::Result<f64> {
    desk.pre_auth()
        .create_request(case_id, patient("Asha Rao"), 50000.0)?;
    desk.pre_auth()
        .record_approval(case_id, 45000.0, "PA-778", "2024-01-09")?;
    let request = desk.final_auth().create_request(case_id, discharge(final_bill))?;
    Ok(request.additional_amount_requested)
}

#[test]
fn test_full_cycle_within_tolerance() -> anyhow::Result<()> {
    let desk = memory_desk();

    let additional = approved_case(&desk, "C1", 60000.0)?;
    assert_eq!(additional, 15000.0);

    let mut deductions = BTreeMap::new();
    deductions.insert("Non-payables".to_string(), 10000.0);
    let gap = desk
        .final_auth()
        .record_approval("C1", 50000.0, "FA-991", "2024-01-15", deductions)?;

    assert_eq!(gap.gap_amount, 10000.0);
    assert!((gap.gap_percentage - 16.67).abs() < 0.01);
    assert!(!gap.requires_escalation);
    assert!(!gap.is_acceptable());
    assert_eq!(gap.total_deductions(), 10000.0);

    let final_auth = desk.final_auth().get("C1")?;
    assert_eq!(final_auth.status(), AuthorizationStatus::Approved);
    assert_eq!(final_auth.pre_auth_approved, 45000.0);
    Ok(())
}

#[test]
fn test_full_cycle_escalates() -> anyhow::Result<()> {
    let desk = memory_desk();
    approved_case(&desk, "C1", 60000.0)?;

    let gap = desk
        .final_auth()
        .record_approval("C1", 40000.0, "FA-992", "2024-01-15", BTreeMap::new())?;

    assert!((gap.gap_percentage - 33.33).abs() < 0.01);
    assert!(gap.requires_escalation);
    Ok(())
}

#[test]
fn test_final_without_pre_auth_not_found() {
    let desk = memory_desk();
    let err = desk
        .final_auth()
        .create_request("C1", discharge(60000.0))
        .unwrap_err();

    assert!(matches!(
        err,
        TrackerError::NotFound {
            record: RecordKind::PreAuthorization,
            ref case_id,
        } if case_id == "C1"
    ));
}

#[test]
fn test_every_operation_not_found_on_unknown_case() {
    let desk = memory_desk();
    let pre = desk.pre_auth();
    let fin = desk.final_auth();

    let outcomes = vec![
        pre.record_query("ghost", "q").map(drop),
        pre.record_approval("ghost", 1.0, "PA", "2024-01-09").map(drop),
        pre.record_partial_approval("ghost", 1.0, "PA", "2024-01-09").map(drop),
        pre.record_rejection("ghost", "r"),
        pre.get("ghost").map(drop),
        fin.create_request("ghost", discharge(60000.0)).map(drop),
        fin.record_query("ghost", "q").map(drop),
        fin.record_approval("ghost", 1.0, "FA", "2024-01-15", BTreeMap::new()).map(drop),
        fin.record_rejection("ghost", "r"),
        fin.get("ghost").map(drop),
    ];

    for outcome in outcomes {
        assert!(matches!(outcome, Err(TrackerError::NotFound { .. })), "{:?}", outcome);
    }
    assert!(desk.store().list_case_ids().unwrap().is_empty());
    assert!(desk.store().get_discharge("ghost").unwrap().is_none());
}

#[test]
fn test_query_rounds_append_in_order() -> anyhow::Result<()> {
    let desk = memory_desk();
    desk.pre_auth()
        .create_request("C1", patient("Asha Rao"), 50000.0)?;

    for round in 1..=3 {
        desk.pre_auth()
            .record_query("C1", &format!("Query round {}", round))?;
    }

    let record = desk.pre_auth().get("C1")?;
    assert_eq!(record.status(), AuthorizationStatus::QueryReplied);
    let queries: Vec<&str> = record
        .lifecycle
        .queries
        .iter()
        .map(|q| q.query.as_str())
        .collect();
    assert_eq!(queries, ["Query round 1", "Query round 2", "Query round 3"]);
    Ok(())
}

struct BrokenService;

impl LetterGenerator for BrokenService {
    fn generate_letter(&self, _request: &LetterRequest) -> GenerationResult<String> {
        Err(GenerationError::EmptyResponse)
    }
}

impl GapAnalyzer for BrokenService {
    fn analyze_gap(&self, _: f64, _: f64, _: &str) -> GenerationResult<String> {
        Err(GenerationError::EmptyResponse)
    }
}

#[test]
fn test_collaborator_failure_propagates_without_mutation() -> anyhow::Result<()> {
    init_tracing();
    let desk = TpaDesk::new(Box::new(MemoryStore::new()), Arc::new(BrokenService));
    let created = desk
        .pre_auth()
        .create_request("C1", patient("Asha Rao"), 50000.0)?;

    assert!(matches!(
        desk.pre_auth().record_query("C1", "q"),
        Err(TrackerError::Collaborator(_))
    ));
    assert_eq!(desk.pre_auth().get("C1")?, created);

    desk.pre_auth()
        .record_approval("C1", 45000.0, "PA-778", "2024-01-09")?;
    assert!(matches!(
        desk.final_auth().create_request("C1", discharge(60000.0)),
        Err(TrackerError::Collaborator(_))
    ));
    assert!(desk.store().get_final_auth("C1")?.is_none());
    assert!(desk.store().get_discharge("C1")?.is_none());
    Ok(())
}

#[test]
fn test_duplicate_pre_auth() -> anyhow::Result<()> {
    let desk = memory_desk();
    desk.pre_auth()
        .create_request("C1", patient("Asha Rao"), 50000.0)?;

    assert!(matches!(
        desk.pre_auth().create_request("C1", patient("Asha Rao"), 1.0),
        Err(TrackerError::DuplicateCase(_))
    ));
    let replaced = desk
        .pre_auth()
        .recreate_request("C1", patient("Asha Rao"), 1.0)?;
    assert_eq!(replaced.requested_amount, 1.0);
    Ok(())
}

#[test]
fn test_pre_auth_snapshot_is_not_live() -> anyhow::Result<()> {
    let desk = memory_desk();
    approved_case(&desk, "C1", 60000.0)?;

    desk.pre_auth()
        .recreate_request("C1", patient("Asha Rao"), 90000.0)?;
    desk.pre_auth()
        .record_approval("C1", 90000.0, "PA-900", "2024-01-20")?;

    let final_auth = desk.final_auth().get("C1")?;
    assert_eq!(final_auth.pre_auth_approved, 45000.0);
    assert_eq!(final_auth.additional_amount_requested, 15000.0);
    Ok(())
}

#[test]
fn test_sqlite_store_keeps_records_across_reopen() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("desk.db");
    let config = DeskConfig {
        database_path: Some(path.to_string_lossy().into_owned()),
    };

    {
        let desk = TpaDesk::open(&config, Arc::new(MockGenerator::new()))?;
        approved_case(&desk, "C1", 60000.0)?;
        desk.final_auth().record_query("C1", "Justify pharmacy")?;
    }

    let desk = TpaDesk::new(
        Box::new(SqliteStore::open(&path)?),
        Arc::new(MockGenerator::new()),
    );
    let final_auth = desk.final_auth().get("C1")?;
    assert_eq!(final_auth.status(), AuthorizationStatus::QueryReplied);
    assert_eq!(final_auth.lifecycle.queries.len(), 1);
    assert_eq!(final_auth.additional_amount_requested, 15000.0);
    assert_eq!(desk.pre_auth().get("C1")?.approved_amount(), Some(45000.0));

    let gap = desk
        .final_auth()
        .record_approval("C1", 50000.0, "FA-991", "2024-01-15", BTreeMap::new())?;
    assert!(!gap.requires_escalation);

    let csv = desk.exporter().export_all()?.to_csv();
    assert_eq!(csv.lines().count(), 3);
    Ok(())
}

#[test]
fn test_concurrent_cases() {
    let desk = memory_desk();

    thread::scope(|s| {
        for i in 0..8 {
            let desk = &desk;
            s.spawn(move || {
                let case_id = format!("C{}", i);
                approved_case(desk, &case_id, 60000.0).unwrap();
                desk.final_auth()
                    .record_approval(&case_id, 50000.0, "FA", "2024-01-15", BTreeMap::new())
                    .unwrap();
            });
        }
    });

    assert_eq!(desk.store().list_case_ids().unwrap().len(), 8);
    for i in 0..8 {
        let record = desk.final_auth().get(&format!("C{}", i)).unwrap();
        assert_eq!(record.status(), AuthorizationStatus::Approved);
    }
}

#[test]
fn test_concurrent_queries_on_one_case_are_not_lost() {
    let desk = memory_desk();
    desk.pre_auth()
        .create_request("C1", patient("Asha Rao"), 50000.0)
        .unwrap();

    thread::scope(|s| {
        for i in 0..10 {
            let desk = &desk;
            s.spawn(move || {
                desk.pre_auth()
                    .record_query("C1", &format!("q{}", i))
                    .unwrap();
            });
        }
    });

    assert_eq!(desk.pre_auth().get("C1").unwrap().lifecycle.queries.len(), 10);
}

/// Gap escalation boundary cases.
struct GapCase {
    id: &'static str,
    billed: f64,
    approved: f64,
    escalate: bool,
}

#[test]
fn test_gap_escalation_cases() {
    let cases = [
        GapCase { id: "exactly-20", billed: 100000.0, approved: 80000.0, escalate: false },
        GapCase { id: "just-over-20", billed: 1000000.0, approved: 799999.0, escalate: true },
        GapCase { id: "full-approval", billed: 60000.0, approved: 60000.0, escalate: false },
        GapCase { id: "over-approval", billed: 60000.0, approved: 70000.0, escalate: false },
        GapCase { id: "nothing-approved", billed: 60000.0, approved: 0.0, escalate: true },
    ];

    for case in cases {
        let desk = memory_desk();
        desk.pre_auth()
            .create_request(case.id, patient("Asha Rao"), 50000.0)
            .unwrap();
        desk.pre_auth()
            .record_approval(case.id, 45000.0, "PA", "2024-01-09")
            .unwrap();
        desk.final_auth()
            .create_request(case.id, discharge(case.billed))
            .unwrap();

        let gap = desk
            .final_auth()
            .record_approval(case.id, case.approved, "FA", "2024-01-15", BTreeMap::new())
            .unwrap();
        assert_eq!(gap.requires_escalation, case.escalate, "case {}", case.id);
    }
}
