use super::common::{admin, applicant, build_service, seeded_request};
use crate::kyc::domain::{KycRequestId, KycStatus, RiskLevel};
use crate::kyc::{KycServiceError, ReviewAction};

#[test]
fn approval_marks_verified_and_low_risk() {
    let (service, store) = build_service();
    let reviewer = admin(&store);
    let owner = applicant(&store);
    let stored = seeded_request(&store, owner.id, "KYC-2025-001");

    service
        .update(
            stored.id,
            crate::kyc::KycRequestPatch {
                risk_level: Some(Some(RiskLevel::High)),
                ..Default::default()
            },
        )
        .expect("risk raised");

    service
        .review(&reviewer, stored.id, ReviewAction::Approve)
        .expect("approved");

    let reread = service.get(stored.id).expect("reread");
    assert_eq!(reread.status, KycStatus::Verified);
    assert_eq!(reread.risk_level, Some(RiskLevel::Low));
}

#[test]
fn reject_and_flag_leave_risk_untouched() {
    let (service, store) = build_service();
    let reviewer = admin(&store);
    let owner = applicant(&store);
    let rejected = seeded_request(&store, owner.id, "KYC-2025-001");
    let flagged = seeded_request(&store, owner.id, "KYC-2025-002");

    let rejected = service
        .review(&reviewer, rejected.id, ReviewAction::Reject)
        .expect("rejected");
    let flagged = service
        .review(&reviewer, flagged.id, ReviewAction::Flag)
        .expect("flagged");

    assert_eq!(rejected.status, KycStatus::Rejected);
    assert_eq!(flagged.status, KycStatus::NeedsReview);
    assert_eq!(flagged.risk_level, Some(RiskLevel::Low));
}

#[test]
fn applicants_cannot_review() {
    let (service, store) = build_service();
    let owner = applicant(&store);
    let stored = seeded_request(&store, owner.id, "KYC-2025-001");

    let err = service
        .review(&owner, stored.id, ReviewAction::Approve)
        .expect_err("not an admin");
    assert!(matches!(err, KycServiceError::Forbidden));
    assert_eq!(
        service.get(stored.id).expect("reread").status,
        KycStatus::InProgress
    );
}

#[test]
fn reviewing_unknown_request_is_not_found() {
    let (service, store) = build_service();
    let reviewer = admin(&store);

    let err = service
        .review(&reviewer, KycRequestId(99), ReviewAction::Flag)
        .expect_err("absent");
    assert!(matches!(err, KycServiceError::NotFound(KycRequestId(99))));
}
