use serde::{Deserialize, Serialize};
use validator::Validate;

use super::domain::{KycRequestPatch, KycStatus, RiskLevel};

/// Decision an administrator applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
    Flag,
}

impl ReviewAction {
    pub const fn target_status(self) -> KycStatus {
        match self {
            Self::Approve => KycStatus::Verified,
            Self::Reject => KycStatus::Rejected,
            Self::Flag => KycStatus::NeedsReview,
        }
    }

    /// Approval forces the risk label to Low; the other actions leave it as stored.
    pub fn patch(self) -> KycRequestPatch {
        KycRequestPatch {
            status: Some(self.target_status()),
            risk_level: match self {
                Self::Approve => Some(Some(RiskLevel::Low)),
                Self::Reject | Self::Flag => None,
            },
            ..KycRequestPatch::default()
        }
    }
}

/// Body of `POST /api/kyc/:id/review`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReviewDecision {
    pub action: ReviewAction,
}
