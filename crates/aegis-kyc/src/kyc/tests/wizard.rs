use super::common::{applicant, build_service};
use crate::kyc::domain::{KycRequestPatch, KycStatus, RiskLevel};
use crate::kyc::scoring::{DocumentType, STUB_CONFIDENCE_SCORE, STUB_EXPLANATION};
use crate::kyc::{KycServiceError, StepSubmission, WizardError, WizardStep};

fn documents() -> StepSubmission {
    StepSubmission {
        document_type: Some(DocumentType::Passport),
        front_url: Some("front.jpg".to_string()),
        ..StepSubmission::for_step(WizardStep::Documents)
    }
}

#[test]
fn full_walk_submits_for_review() {
    let (service, store) = build_service();
    let user = applicant(&store);

    let fresh = service.wizard_state(&user).expect("state");
    assert_eq!(fresh.current_step, WizardStep::PersonalInfo);
    assert!(fresh.request_id.is_none());

    let first = service
        .advance(
            &user,
            StepSubmission {
                phone: Some("+91 98765 43210".to_string()),
                ..StepSubmission::for_step(WizardStep::PersonalInfo)
            },
        )
        .expect("personal info");
    assert_eq!(first.next_step, Some(WizardStep::Documents));
    assert!(first.request.kyc_id.starts_with("KYC-2025-"));
    let personal = first
        .request
        .data
        .personal_info
        .clone()
        .expect("personal info stored");
    assert_eq!(personal.name.as_deref(), Some(user.full_name.as_str()));
    assert_eq!(personal.phone.as_deref(), Some("+91 98765 43210"));
    assert_eq!(personal.dob.as_deref(), Some("1990-01-01"));

    service.advance(&user, documents()).expect("documents");
    service
        .advance(&user, StepSubmission::for_step(WizardStep::FaceScan))
        .expect("face scan");
    let last = service
        .advance(&user, StepSubmission::for_step(WizardStep::Review))
        .expect("review");

    assert!(last.submitted);
    assert_eq!(last.next_step, None);
    let request = last.request;
    assert_eq!(request.id, first.request.id);
    assert_eq!(request.status, KycStatus::PendingReview);
    assert_eq!(request.confidence_score, STUB_CONFIDENCE_SCORE);
    assert_eq!(request.risk_level, Some(RiskLevel::Low));
    assert_eq!(request.ai_explanation.as_deref(), Some(STUB_EXPLANATION));
    assert_eq!(request.current_step, 4);

    let documents = request.data.documents.expect("documents stored");
    assert_eq!(documents.document_type.as_deref(), Some("passport"));
    assert_eq!(documents.front_url.as_deref(), Some("front.jpg"));
    let biometrics = request.data.biometrics.expect("biometrics stored");
    assert_eq!(biometrics.liveness_score, Some(98));
    assert_eq!(biometrics.face_scan_url.as_deref(), Some("mock_face.jpg"));
    assert!(request.data.personal_info.is_some());
}

#[test]
fn skipping_a_step_is_refused() {
    let (service, store) = build_service();
    let user = applicant(&store);

    let err = service.advance(&user, documents()).expect_err("no request yet");
    assert!(matches!(
        err,
        KycServiceError::Wizard(WizardError::OutOfOrder {
            expected: 1,
            found: 2
        })
    ));

    service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect("personal info");
    let err = service
        .advance(&user, StepSubmission::for_step(WizardStep::Review))
        .expect_err("jump to review");
    assert!(matches!(
        err,
        KycServiceError::Wizard(WizardError::OutOfOrder {
            expected: 2,
            found: 4
        })
    ));
}

#[test]
fn documents_step_requires_a_type() {
    let (service, store) = build_service();
    let user = applicant(&store);
    service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect("personal info");

    let err = service
        .advance(&user, StepSubmission::for_step(WizardStep::Documents))
        .expect_err("type missing");
    assert!(matches!(
        err,
        KycServiceError::Wizard(WizardError::MissingDocumentType)
    ));
    let state = service.wizard_state(&user).expect("state");
    assert_eq!(state.current_step, WizardStep::Documents);
}

#[test]
fn resume_picks_up_the_stored_step() {
    let (service, store) = build_service();
    let user = applicant(&store);
    let first = service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect("personal info");
    service.advance(&user, documents()).expect("documents");

    let state = service.wizard_state(&user).expect("state");
    assert_eq!(state.request_id, Some(first.request.id));
    assert_eq!(state.current_step, WizardStep::FaceScan);
    assert_eq!(state.step_title, "Face Scan");
    assert_eq!(state.status, Some(KycStatus::InProgress));
}

#[test]
fn submitted_request_no_longer_accepts_steps() {
    let (service, store) = build_service();
    let user = applicant(&store);
    for submission in [
        StepSubmission::for_step(WizardStep::PersonalInfo),
        documents(),
        StepSubmission::for_step(WizardStep::FaceScan),
        StepSubmission::for_step(WizardStep::Review),
    ] {
        service.advance(&user, submission).expect("step");
    }

    let err = service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect_err("awaiting review");
    assert!(matches!(
        err,
        KycServiceError::Wizard(WizardError::Closed(KycStatus::PendingReview))
    ));
}

#[test]
fn decided_request_lets_the_applicant_start_over() {
    let (service, store) = build_service();
    let user = applicant(&store);
    let first = service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect("personal info");
    service
        .update(
            first.request.id,
            KycRequestPatch {
                status: Some(KycStatus::Rejected),
                ..KycRequestPatch::default()
            },
        )
        .expect("rejected");

    assert!(service.wizard_state(&user).expect("state").request_id.is_none());
    let second = service
        .advance(&user, StepSubmission::for_step(WizardStep::PersonalInfo))
        .expect("new request");
    assert_ne!(second.request.id, first.request.id);
}
