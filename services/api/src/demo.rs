use crate::infra::{seed_demo_data, DEMO_EMAIL, DEMO_PASSWORD};
use aegis_kyc::clock::SystemClock;
use aegis_kyc::error::{ApiError, AppError};
use aegis_kyc::identity::{Credentials, IdentityService, NewUser, Role};
use aegis_kyc::kyc::{
    DocumentType, KycService, ReviewAction, StepSubmission, StubVerificationEngine, WizardStep,
};
use aegis_kyc::session::{MemorySessionStorage, SessionManager};
use aegis_kyc::storage::memory::InMemoryStore;
use clap::{Args, ValueEnum};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoDecision {
    Approve,
    Reject,
    Flag,
}

impl From<DemoDecision> for ReviewAction {
    fn from(value: DemoDecision) -> Self {
        match value {
            DemoDecision::Approve => ReviewAction::Approve,
            DemoDecision::Reject => ReviewAction::Reject,
            DemoDecision::Flag => ReviewAction::Flag,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant email used for the walkthrough signup
    #[arg(long, default_value = "applicant@example.com")]
    pub(crate) email: String,
    /// Applicant display name
    #[arg(long, default_value = "Priya Nair")]
    pub(crate) full_name: String,
    /// Identity document submitted in the documents step (passport, dl, id_card)
    #[arg(long, default_value = "passport")]
    pub(crate) document_type: String,
    /// Decision the demo administrator applies once the request is submitted
    #[arg(long, value_enum, default_value_t = DemoDecision::Approve)]
    pub(crate) decision: DemoDecision,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        email,
        full_name,
        document_type,
        decision,
    } = args;
    let document_type = parse_document_type(&document_type)?;

    let store = Arc::new(InMemoryStore::default());
    seed_demo_data(store.as_ref())?;
    let identity = IdentityService::new(store.clone());
    let kyc = KycService::new(store, Arc::new(StubVerificationEngine));
    let sessions = SessionManager::new(MemorySessionStorage::default(), Arc::new(SystemClock));

    println!("AegisKYC walkthrough");

    identity
        .signup(NewUser {
            email: email.clone(),
            password: DEMO_PASSWORD.to_string(),
            full_name,
            role: Role::User,
        })
        .map_err(ApiError::from)?;
    let applicant = identity
        .login(&Credentials {
            email,
            password: DEMO_PASSWORD.to_string(),
        })
        .map_err(ApiError::from)?;
    let session = sessions.sign_in(applicant)?;
    println!(
        "- Signed in {} ({}) -> {}",
        session.user.full_name,
        session.user.role.label(),
        session.home_path()
    );

    let submissions = [
        StepSubmission::for_step(WizardStep::PersonalInfo),
        StepSubmission {
            document_type: Some(document_type),
            ..StepSubmission::for_step(WizardStep::Documents)
        },
        StepSubmission::for_step(WizardStep::FaceScan),
        StepSubmission::for_step(WizardStep::Review),
    ];

    let mut submitted = None;
    for submission in submissions {
        let step = WizardStep::from_number(submission.step).unwrap_or(WizardStep::Review);
        let outcome = kyc
            .advance(&session.user, submission)
            .map_err(ApiError::from)?;
        println!(
            "  step {} {:<13} -> {} (v{})",
            step.number(),
            step.title(),
            outcome.request.status,
            outcome.request.version
        );
        submitted = Some(outcome.request);
    }
    let Some(request) = submitted else {
        return Ok(());
    };
    println!(
        "- Submitted {} | confidence {} | risk {}",
        request.kyc_id,
        request.confidence_score,
        request.risk_level.map_or("n/a", |level| level.label())
    );
    sessions.sign_out()?;

    let admin = identity
        .login(&Credentials {
            email: DEMO_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
        })
        .map_err(ApiError::from)?;
    let session = sessions.sign_in(admin)?;
    let reviewed = kyc
        .review(&session.user, request.id, decision.into())
        .map_err(ApiError::from)?;
    println!(
        "- {} reviewed {} -> {}",
        session.user.full_name, reviewed.kyc_id, reviewed.status
    );

    let stats = kyc.stats().map_err(ApiError::from)?;
    println!("\nDashboard");
    println!(
        "- total {} | approved {} | in progress {} | awaiting review {}",
        stats.total, stats.approved, stats.pending, stats.review_required
    );
    for bucket in &stats.risk_distribution {
        println!("  {:<6} {}", bucket.name, bucket.value);
    }
    sessions.sign_out()?;

    Ok(())
}

fn parse_document_type(raw: &str) -> Result<DocumentType, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|_| ApiError::BadRequest(format!("Unknown document type '{raw}'")))
}
