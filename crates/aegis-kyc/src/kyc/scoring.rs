use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{Biometrics, DocumentInfo, KycRequest, RiskLevel};

/// Identity document accepted by the document step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "passport")]
    Passport,
    #[serde(rename = "dl")]
    DriversLicense,
    #[serde(rename = "id_card")]
    NationalIdCard,
}

impl DocumentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::DriversLicense => "dl",
            Self::NationalIdCard => "id_card",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::DriversLicense => "Driver's License",
            Self::NationalIdCard => "National ID Card",
        }
    }
}

/// Final assessment written onto a request at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub confidence_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
}

/// Seam for the document, liveness, and risk engine.
pub trait VerificationEngine: Send + Sync {
    fn analyze_document(
        &self,
        document_type: DocumentType,
        front_url: Option<String>,
        back_url: Option<String>,
    ) -> DocumentInfo;

    fn check_liveness(&self, face_scan_url: Option<String>) -> Biometrics;

    fn verdict(&self, request: &KycRequest) -> Verdict;
}

pub const STUB_CONFIDENCE_SCORE: u8 = 85;
pub const STUB_LIVENESS_SCORE: u8 = 98;
pub const STUB_EXPLANATION: &str = "Document matches profile. Liveness check passed with 98% confidence. No sanctions matches found.";

/// Fixed-value engine: every applicant passes with the same scores.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubVerificationEngine;

impl VerificationEngine for StubVerificationEngine {
    fn analyze_document(
        &self,
        document_type: DocumentType,
        front_url: Option<String>,
        back_url: Option<String>,
    ) -> DocumentInfo {
        let mut extracted = BTreeMap::new();
        extracted.insert(
            "docNumber".to_string(),
            Value::String("A1234567".to_string()),
        );

        DocumentInfo {
            document_type: Some(document_type.as_str().to_string()),
            front_url: front_url.or_else(|| Some("mock_url.jpg".to_string())),
            back_url,
            extracted_data: Some(extracted),
            ..DocumentInfo::default()
        }
    }

    fn check_liveness(&self, face_scan_url: Option<String>) -> Biometrics {
        Biometrics {
            face_scan_url: face_scan_url.or_else(|| Some("mock_face.jpg".to_string())),
            liveness_score: Some(STUB_LIVENESS_SCORE),
            ..Biometrics::default()
        }
    }

    fn verdict(&self, _request: &KycRequest) -> Verdict {
        Verdict {
            confidence_score: STUB_CONFIDENCE_SCORE,
            risk_level: RiskLevel::Low,
            explanation: STUB_EXPLANATION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_types_use_form_values() {
        let parsed: DocumentType = serde_json::from_str("\"dl\"").expect("parses");
        assert_eq!(parsed, DocumentType::DriversLicense);
        assert_eq!(parsed.label(), "Driver's License");
        assert!(serde_json::from_str::<DocumentType>("\"library_card\"").is_err());
    }

    #[test]
    fn stub_keeps_supplied_urls() {
        let engine = StubVerificationEngine;
        let document = engine.analyze_document(
            DocumentType::Passport,
            Some("front.png".to_string()),
            None,
        );
        assert_eq!(document.document_type.as_deref(), Some("passport"));
        assert_eq!(document.front_url.as_deref(), Some("front.png"));
        assert!(document
            .extracted_data
            .as_ref()
            .is_some_and(|data| data.contains_key("docNumber")));

        let biometrics = engine.check_liveness(None);
        assert_eq!(biometrics.face_scan_url.as_deref(), Some("mock_face.jpg"));
        assert_eq!(biometrics.liveness_score, Some(98));
    }
}
