//! Verification requests: domain records, the applicant wizard, admin review, and stats.

pub mod domain;
pub mod review;
pub mod scoring;
pub mod service;
pub mod stats;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    Biometrics, DocumentInfo, KycData, KycRequest, KycRequestId, KycRequestPatch, KycStatus,
    NewKycRequest, PersonalInfo, RiskLevel, Signals, FIRST_STEP, LAST_STEP,
};
pub use review::{ReviewAction, ReviewDecision};
pub use scoring::{DocumentType, StubVerificationEngine, Verdict, VerificationEngine};
pub use service::{KycService, KycServiceError};
pub use stats::{AdminStats, DailyVolume, RiskBucket};
pub use wizard::{StepOutcome, StepSubmission, WizardError, WizardState, WizardStep};
