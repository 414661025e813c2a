//! Case blocks handed to the letter generator.

use tpa_desk_llm::{format_amount, LetterPhase, LetterRequest};

use crate::models::{
    or_na, CaseRecord, DischargeRecord, FinalAuthorizationRecord, PreAuthorizationRecord,
};

/// Letter request with the hospital as sender and the insurer as recipient.
pub fn letter_request(case: &CaseRecord, case_block: String, phase: LetterPhase) -> LetterRequest {
    LetterRequest {
        party_a: case.patient.hospital.to_block(),
        party_b: case.patient.insurer.to_block(),
        case_block,
        phase,
    }
}

/// Reply instructions for a pre-authorization query.
pub fn pre_auth_query_block(query: &str) -> String {
    format!(
        "Query:\n{}\n\nRespond point-wise with medical/policy justification.",
        query
    )
}

/// Case summary sent with the final-authorization request.
pub fn final_request_block(
    case: &CaseRecord,
    pre_auth: &PreAuthorizationRecord,
    final_auth: &FinalAuthorizationRecord,
    discharge: &DischargeRecord,
) -> String {
    let data = &discharge.data;

    let mut block = format!(
        "CASE:\n\
         - Patient: {}\n\
         - Pre-auth Approved: ₹{} (Ref: {})\n\
         - Final Bill: ₹{}\n\
         - Additional Needed: ₹{}\n\
         \n\
         DISCHARGE SUMMARY:\n\
         - Admission: {}\n\
         - Discharge: {}\n\
         - Final Diagnosis: {}\n\
         - Procedures: {}\n\
         - LOS: {} days\n\
         - Complications: {}\n\
         \n\
         BILL BREAKDOWN:\n",
        case.patient.display_name(),
        format_amount(final_auth.pre_auth_approved),
        or_na(pre_auth.approval_number()),
        format_amount(final_auth.final_bill_amount),
        format_amount(final_auth.additional_amount_requested),
        or_na(data.admission_date.as_deref()),
        or_na(data.discharge_date.as_deref()),
        or_na(data.final_diagnosis.as_deref()),
        discharge.procedures_line(),
        data.length_of_stay_days,
        data.complications.as_deref().unwrap_or("None"),
    );

    for (label, amount) in data.charges.lines() {
        block.push_str(&format!("{}: ₹{}\n", label, format_amount(amount)));
    }

    block
}

/// Reply instructions for a final-authorization query.
pub fn final_query_block(query: &str, discharge: &DischargeRecord) -> String {
    format!(
        "FINAL AUTH QUERY:\n\
         - Query: {}\n\
         - Discharge Dx: {}\n\
         - LOS: {} days\n\
         - Procedures: {}\n\
         Provide clear justification and list documents if needed.",
        query,
        or_na(discharge.data.final_diagnosis.as_deref()),
        discharge.data.length_of_stay_days,
        discharge.procedures_line(),
    )
}
