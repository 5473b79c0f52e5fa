use serde::{Deserialize, Serialize};
use validator::Validate;

use super::domain::{KycRequest, KycRequestId, KycStatus};
use super::scoring::DocumentType;

/// Ordered steps of the applicant wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WizardStep {
    PersonalInfo,
    Documents,
    FaceScan,
    Review,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::PersonalInfo,
            Self::Documents,
            Self::FaceScan,
            Self::Review,
        ]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::PersonalInfo => 1,
            Self::Documents => 2,
            Self::FaceScan => 3,
            Self::Review => 4,
        }
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::PersonalInfo),
            2 => Some(Self::Documents),
            3 => Some(Self::FaceScan),
            4 => Some(Self::Review),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal Info",
            Self::Documents => "Documents",
            Self::FaceScan => "Face Scan",
            Self::Review => "Review",
        }
    }

    /// `None` once the review step is completed, i.e. the request is submitted.
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Back navigation is client-local; the stored record keeps its step.
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::PersonalInfo => None,
            other => Self::from_number(other.number() - 1),
        }
    }
}

impl Serialize for WizardStep {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for WizardStep {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let number = u8::deserialize(deserializer)?;
        Self::from_number(number).ok_or_else(|| {
            serde::de::Error::custom(format!("step must be between 1 and 4, found {number}"))
        })
    }
}

/// Transition refusals raised by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("step {found} is out of order; the request is at step {expected}")]
    OutOfOrder { expected: u8, found: u8 },
    #[error("request is {0} and no longer accepts wizard steps")]
    Closed(KycStatus),
    #[error("documentType is required to complete the documents step")]
    MissingDocumentType,
}

/// Check that completing `step` is the next legal move for the user's open request.
pub fn check_advance(open: Option<&KycRequest>, step: WizardStep) -> Result<(), WizardError> {
    let expected = match open {
        Some(request) if request.status != KycStatus::InProgress => {
            return Err(WizardError::Closed(request.status));
        }
        Some(request) => request.current_step,
        None => WizardStep::PersonalInfo.number(),
    };

    if step.number() != expected {
        return Err(WizardError::OutOfOrder {
            expected,
            found: step.number(),
        });
    }
    Ok(())
}

/// A direct `currentStep` write may stay put or move forward by exactly one.
pub fn check_step_write(stored: u8, requested: u8) -> Result<(), WizardError> {
    if requested < stored || requested > stored.saturating_add(1) {
        return Err(WizardError::OutOfOrder {
            expected: stored,
            found: requested,
        });
    }
    Ok(())
}

/// Body of `POST /api/wizard/advance`: the step being completed plus its form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StepSubmission {
    #[validate(range(min = 1, max = 4, message = "step must be between 1 and 4"))]
    pub step: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_scan_url: Option<String>,
}

impl StepSubmission {
    pub fn for_step(step: WizardStep) -> Self {
        Self {
            step: step.number(),
            ..Self::default()
        }
    }
}

/// Where an applicant resumes the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    pub request_id: Option<KycRequestId>,
    pub kyc_id: Option<String>,
    pub status: Option<KycStatus>,
    pub current_step: WizardStep,
    pub step_title: &'static str,
}

impl WizardState {
    pub fn fresh() -> Self {
        Self::at(None, WizardStep::PersonalInfo)
    }

    pub fn resume(request: &KycRequest) -> Self {
        let step = WizardStep::from_number(request.current_step).unwrap_or(WizardStep::Review);
        Self::at(Some(request), step)
    }

    fn at(request: Option<&KycRequest>, step: WizardStep) -> Self {
        Self {
            request_id: request.map(|r| r.id),
            kyc_id: request.map(|r| r.kyc_id.clone()),
            status: request.map(|r| r.status),
            current_step: step,
            step_title: step.title(),
        }
    }
}

/// Result of completing a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub request: KycRequest,
    /// `None` once the request has been submitted for review.
    pub next_step: Option<WizardStep>,
    pub submitted: bool,
}
