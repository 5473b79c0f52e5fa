use std::sync::Arc;

use chrono::Datelike;
use rand::Rng;
use tracing::{debug, info};

use super::domain::{
    KycData, KycRequest, KycRequestId, KycRequestPatch, KycStatus, NewKycRequest, PersonalInfo,
};
use super::review::ReviewAction;
use super::scoring::VerificationEngine;
use super::stats::AdminStats;
use super::wizard::{
    check_advance, check_step_write, StepOutcome, StepSubmission, WizardError, WizardState,
    WizardStep,
};
use crate::clock::{Clock, SystemClock};
use crate::identity::{User, UserId};
use crate::storage::{KycRepository, RepositoryError};

const PLACEHOLDER_PHONE: &str = "+1234567890";
const PLACEHOLDER_DOB: &str = "1990-01-01";
const PLACEHOLDER_ADDRESS: &str = "123 Main St, City, Country";

/// Request lifecycle: CRUD, the applicant wizard, admin review, and dashboard stats.
pub struct KycService<K, V> {
    repository: Arc<K>,
    engine: Arc<V>,
    clock: Arc<dyn Clock>,
}

impl<K, V> KycService<K, V>
where
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    pub fn new(repository: Arc<K>, engine: Arc<V>) -> Self {
        Self::with_clock(repository, engine, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<K>, engine: Arc<V>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            engine,
            clock,
        }
    }

    pub fn list(&self) -> Result<Vec<KycRequest>, KycServiceError> {
        Ok(self.repository.list_requests()?)
    }

    pub fn get(&self, id: KycRequestId) -> Result<KycRequest, KycServiceError> {
        self.repository
            .fetch_request(id)?
            .ok_or(KycServiceError::NotFound(id))
    }

    pub fn create(&self, request: NewKycRequest) -> Result<KycRequest, KycServiceError> {
        let stored = self.repository.insert_request(request)?;
        info!(request_id = %stored.id, kyc_id = %stored.kyc_id, user_id = %stored.user_id, "kyc request created");
        Ok(stored)
    }

    /// Merge a partial update into the stored record.
    pub fn update(
        &self,
        id: KycRequestId,
        patch: KycRequestPatch,
    ) -> Result<KycRequest, KycServiceError> {
        let mut record = self.get(id)?;

        if let Some(expected) = patch.expected_version {
            if expected != record.version {
                return Err(KycServiceError::StaleVersion {
                    id,
                    expected,
                    actual: record.version,
                });
            }
        }
        if let Some(step) = patch.current_step {
            check_step_write(record.current_step, step)?;
        }

        record.apply(patch);
        let stored = self
            .repository
            .update_request(record)
            .map_err(|err| KycServiceError::from_write(id, err))?;

        debug!(request_id = %id, version = stored.version, status = %stored.status, "kyc request updated");
        Ok(stored)
    }

    pub fn stats(&self) -> Result<AdminStats, KycServiceError> {
        let requests = self.repository.list_requests()?;
        Ok(AdminStats::from_requests(&requests))
    }

    /// The user's newest request that has not reached a final decision.
    pub fn open_request(&self, user_id: UserId) -> Result<Option<KycRequest>, KycServiceError> {
        Ok(self
            .repository
            .requests_for_user(user_id)?
            .into_iter()
            .find(|request| !request.status.is_terminal()))
    }

    pub fn wizard_state(&self, user: &User) -> Result<WizardState, KycServiceError> {
        Ok(match self.open_request(user.id)? {
            Some(request) => WizardState::resume(&request),
            None => WizardState::fresh(),
        })
    }

    /// Complete one wizard step for `user`, persisting the step's payload.
    pub fn advance(
        &self,
        user: &User,
        submission: StepSubmission,
    ) -> Result<StepOutcome, KycServiceError> {
        let open = self.open_request(user.id)?;
        let step = WizardStep::from_number(submission.step).ok_or(WizardError::OutOfOrder {
            expected: open
                .as_ref()
                .map_or(WizardStep::PersonalInfo.number(), |r| r.current_step),
            found: submission.step,
        })?;
        check_advance(open.as_ref(), step)?;

        let request = match (step, open) {
            (WizardStep::PersonalInfo, None) => self.create(NewKycRequest {
                current_step: WizardStep::Documents.number(),
                data: KycData {
                    personal_info: Some(personal_info(user, &submission)),
                    ..KycData::default()
                },
                ..NewKycRequest::for_user(user.id, self.next_kyc_id())
            })?,
            (_, None) => {
                return Err(WizardError::OutOfOrder {
                    expected: WizardStep::PersonalInfo.number(),
                    found: step.number(),
                }
                .into())
            }
            (step, Some(open)) => {
                let patch = self.step_patch(user, &open, step, submission)?;
                self.update(open.id, patch)?
            }
        };

        let submitted = step == WizardStep::Review;
        if submitted {
            info!(request_id = %request.id, kyc_id = %request.kyc_id, "kyc request submitted for review");
        } else {
            debug!(request_id = %request.id, step = step.number(), "wizard step completed");
        }

        Ok(StepOutcome {
            next_step: step.next(),
            submitted,
            request,
        })
    }

    fn step_patch(
        &self,
        user: &User,
        open: &KycRequest,
        step: WizardStep,
        submission: StepSubmission,
    ) -> Result<KycRequestPatch, KycServiceError> {
        let mut patch = KycRequestPatch {
            current_step: step.next().map(WizardStep::number),
            expected_version: Some(open.version),
            ..KycRequestPatch::default()
        };

        match step {
            WizardStep::PersonalInfo => {
                patch.data = Some(KycData {
                    personal_info: Some(personal_info(user, &submission)),
                    ..KycData::default()
                });
            }
            WizardStep::Documents => {
                let document_type = submission
                    .document_type
                    .ok_or(WizardError::MissingDocumentType)?;
                let documents = self.engine.analyze_document(
                    document_type,
                    submission.front_url,
                    submission.back_url,
                );
                patch.data = Some(KycData {
                    documents: Some(documents),
                    ..KycData::default()
                });
            }
            WizardStep::FaceScan => {
                let biometrics = self.engine.check_liveness(submission.face_scan_url);
                patch.data = Some(KycData {
                    biometrics: Some(biometrics),
                    ..KycData::default()
                });
            }
            WizardStep::Review => {
                let verdict = self.engine.verdict(open);
                patch.status = Some(KycStatus::PendingReview);
                patch.confidence_score = Some(verdict.confidence_score);
                patch.risk_level = Some(Some(verdict.risk_level));
                patch.ai_explanation = Some(Some(verdict.explanation));
            }
        }

        Ok(patch)
    }

    /// Apply an administrator decision.
    pub fn review(
        &self,
        reviewer: &User,
        id: KycRequestId,
        action: ReviewAction,
    ) -> Result<KycRequest, KycServiceError> {
        if !reviewer.is_admin() {
            return Err(KycServiceError::Forbidden);
        }

        let stored = self.update(id, action.patch())?;
        info!(
            request_id = %id,
            reviewer_id = %reviewer.id,
            status = %stored.status,
            "review decision applied"
        );
        Ok(stored)
    }

    /// Display identifier: year plus a random four digit suffix. Not guaranteed unique.
    fn next_kyc_id(&self) -> String {
        let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
        format!("KYC-{}-{suffix:04}", self.clock.now().year())
    }
}

fn personal_info(user: &User, submission: &StepSubmission) -> PersonalInfo {
    let or_placeholder = |value: &Option<String>, placeholder: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(placeholder)
            .to_string()
    };

    PersonalInfo {
        name: Some(user.full_name.clone()),
        email: Some(user.email.clone()),
        phone: Some(or_placeholder(&submission.phone, PLACEHOLDER_PHONE)),
        dob: Some(or_placeholder(&submission.dob, PLACEHOLDER_DOB)),
        address: Some(or_placeholder(&submission.address, PLACEHOLDER_ADDRESS)),
        ..PersonalInfo::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KycServiceError {
    #[error("Request not found")]
    NotFound(KycRequestId),
    #[error("request {id} changed concurrently (expected version {expected}, found {actual})")]
    StaleVersion {
        id: KycRequestId,
        expected: u64,
        actual: u64,
    },
    #[error("only administrators may review requests")]
    Forbidden,
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl KycServiceError {
    fn from_write(id: KycRequestId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(id),
            RepositoryError::VersionMismatch { expected, actual } => Self::StaleVersion {
                id,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}
