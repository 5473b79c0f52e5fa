use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::identity::UserId;

/// Serial identifier assigned by the request store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KycRequestId(pub i64);

impl fmt::Display for KycRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a verification request.
///
/// `Completed` and `PendingReview` are legacy spellings still accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Pending Review", alias = "PendingReview")]
    PendingReview,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "Verified", alias = "Completed")]
    Verified,
    #[serde(rename = "Rejected")]
    Rejected,
}

impl KycStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::PendingReview => "Pending Review",
            Self::NeedsReview => "Needs Review",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Verified | Self::Rejected)
    }

    /// Waiting on an administrator.
    pub const fn awaits_review(self) -> bool {
        matches!(self, Self::PendingReview | Self::NeedsReview)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn ordered() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Applicant details. Every field is optional so partial sections can be written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Keys this service does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biometrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_scan_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_score: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Device and network observations attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_reputation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Semi-structured form payload. Every section is optional and unknown keys survive a round
/// trip at both levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometrics: Option<Biometrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<Signals>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KycData {
    /// Overlay the sections present in `other`; absent sections keep their stored value.
    pub fn merge(&mut self, other: KycData) {
        if let Some(personal_info) = other.personal_info {
            self.personal_info = Some(personal_info);
        }
        if let Some(documents) = other.documents {
            self.documents = Some(documents);
        }
        if let Some(biometrics) = other.biometrics {
            self.biometrics = Some(biometrics);
        }
        if let Some(signals) = other.signals {
            self.signals = Some(signals);
        }
        self.extra.extend(other.extra);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRequest {
    pub id: KycRequestId,
    pub user_id: UserId,
    pub kyc_id: String,
    pub status: KycStatus,
    pub risk_level: Option<RiskLevel>,
    pub confidence_score: u8,
    pub ai_explanation: Option<String>,
    pub current_step: u8,
    pub data: KycData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented by the store on every write.
    pub version: u64,
}

impl KycRequest {
    /// Overwrite every field carried by the patch.
    pub fn apply(&mut self, patch: KycRequestPatch) {
        let KycRequestPatch {
            user_id,
            kyc_id,
            status,
            risk_level,
            confidence_score,
            ai_explanation,
            current_step,
            data,
            expected_version: _,
        } = patch;

        if let Some(user_id) = user_id {
            self.user_id = user_id;
        }
        if let Some(kyc_id) = kyc_id {
            self.kyc_id = kyc_id;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(risk_level) = risk_level {
            self.risk_level = risk_level;
        }
        if let Some(confidence_score) = confidence_score {
            self.confidence_score = confidence_score;
        }
        if let Some(ai_explanation) = ai_explanation {
            self.ai_explanation = ai_explanation;
        }
        if let Some(current_step) = current_step {
            self.current_step = current_step;
        }
        if let Some(data) = data {
            self.data.merge(data);
        }
    }
}

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 4;

fn default_risk_level() -> Option<RiskLevel> {
    Some(RiskLevel::Low)
}

fn default_step() -> u8 {
    FIRST_STEP
}

/// Insertable request shape. Omitted fields take the store defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewKycRequest {
    pub user_id: UserId,
    #[validate(length(min = 1, message = "kycId is required"))]
    pub kyc_id: String,
    #[serde(default)]
    pub status: KycStatus,
    #[serde(default = "default_risk_level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    #[validate(range(max = 100, message = "confidenceScore must be between 0 and 100"))]
    pub confidence_score: u8,
    #[serde(default)]
    pub ai_explanation: Option<String>,
    #[serde(default = "default_step")]
    #[validate(range(min = 1, max = 4, message = "currentStep must be between 1 and 4"))]
    pub current_step: u8,
    #[serde(default)]
    pub data: KycData,
}

impl NewKycRequest {
    pub fn for_user(user_id: UserId, kyc_id: impl Into<String>) -> Self {
        Self {
            user_id,
            kyc_id: kyc_id.into(),
            status: KycStatus::InProgress,
            risk_level: default_risk_level(),
            confidence_score: 0,
            ai_explanation: None,
            current_step: FIRST_STEP,
            data: KycData::default(),
        }
    }
}

/// Maps a present key to `Some`, so an explicit `null` becomes `Some(None)`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `expectedVersion`, when present, must match the stored version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KycRequestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "kycId is required"))]
    pub kyc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<KycStatus>,
    /// `null` clears the stored level; an absent key leaves it alone.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_level: Option<Option<RiskLevel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 100, message = "confidenceScore must be between 0 and 100"))]
    pub confidence_score: Option<u8>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_explanation: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 4, message = "currentStep must be between 1 and 4"))]
    pub current_step: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<KycData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_display_labels_and_accepts_legacy_spellings() {
        assert_eq!(
            serde_json::to_value(KycStatus::PendingReview).expect("serializes"),
            json!("Pending Review")
        );
        let legacy: KycStatus = serde_json::from_value(json!("Completed")).expect("alias");
        assert_eq!(legacy, KycStatus::Verified);
        let legacy: KycStatus = serde_json::from_value(json!("PendingReview")).expect("alias");
        assert_eq!(legacy, KycStatus::PendingReview);
        assert!(serde_json::from_value::<KycStatus>(json!("Approved")).is_err());
    }

    #[test]
    fn new_request_defaults_apply_when_fields_omitted() {
        let request: NewKycRequest = serde_json::from_value(json!({
            "userId": 1,
            "kycId": "KYC-2025-099"
        }))
        .expect("parses");

        assert_eq!(request.status, KycStatus::InProgress);
        assert_eq!(request.risk_level, Some(RiskLevel::Low));
        assert_eq!(request.confidence_score, 0);
        assert_eq!(request.current_step, 1);
        assert_eq!(request.data, KycData::default());
    }

    #[test]
    fn merge_keeps_sections_missing_from_the_overlay() {
        let mut data = KycData {
            personal_info: Some(PersonalInfo {
                name: Some("Amit Sharma".to_string()),
                address: Some("Bangalore".to_string()),
                ..PersonalInfo::default()
            }),
            ..KycData::default()
        };

        data.merge(KycData {
            biometrics: Some(Biometrics {
                face_scan_url: Some("face.jpg".to_string()),
                liveness_score: Some(98),
                ..Biometrics::default()
            }),
            ..KycData::default()
        });

        assert!(data.personal_info.is_some());
        assert_eq!(
            data.biometrics.and_then(|b| b.liveness_score),
            Some(98)
        );
    }

    #[test]
    fn patch_validation_rejects_out_of_range_values() {
        let patch = KycRequestPatch {
            current_step: Some(5),
            ..KycRequestPatch::default()
        };
        assert!(patch.validate().is_err());

        let patch = KycRequestPatch {
            confidence_score: Some(101),
            ..KycRequestPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn unmodelled_keys_survive_a_round_trip() {
        let raw = json!({
            "personalInfo": { "name": "Only Name" },
            "signals": { "device": "x", "browser": "firefox" },
            "notes": "keep me"
        });

        let data: KycData = serde_json::from_value(raw.clone()).expect("parses");
        assert_eq!(
            data.personal_info.as_ref().and_then(|p| p.name.as_deref()),
            Some("Only Name")
        );
        assert_eq!(
            data.signals.as_ref().and_then(|s| s.extra.get("browser")),
            Some(&json!("firefox"))
        );
        assert_eq!(serde_json::to_value(&data).expect("serializes"), raw);
    }

    #[test]
    fn merge_overlays_top_level_extra_keys() {
        let mut data: KycData =
            serde_json::from_value(json!({ "notes": "first", "channel": "web" })).expect("parses");
        data.merge(serde_json::from_value(json!({ "notes": "second" })).expect("parses"));

        assert_eq!(data.extra.get("notes"), Some(&json!("second")));
        assert_eq!(data.extra.get("channel"), Some(&json!("web")));
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let patch: KycRequestPatch =
            serde_json::from_value(json!({ "riskLevel": null, "aiExplanation": null }))
                .expect("parses");
        assert_eq!(patch.risk_level, Some(None));
        assert_eq!(patch.ai_explanation, Some(None));

        let omitted: KycRequestPatch = serde_json::from_value(json!({})).expect("parses");
        assert_eq!(omitted.risk_level, None);
        assert_eq!(omitted.ai_explanation, None);

        let set: KycRequestPatch =
            serde_json::from_value(json!({ "riskLevel": "High" })).expect("parses");
        assert_eq!(set.risk_level, Some(Some(RiskLevel::High)));
    }
}
