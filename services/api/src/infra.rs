use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use aegis_kyc::identity::{NewUser, Role, User};
use aegis_kyc::kyc::{
    DocumentInfo, KycData, KycStatus, NewKycRequest, PersonalInfo, RiskLevel, Signals, LAST_STEP,
};
use aegis_kyc::storage::{KycRepository, RepositoryError, UserRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_EMAIL: &str = "demo@example.com";
pub(crate) const DEMO_PASSWORD: &str = "password";

/// Insert the demo administrator and three sample requests. Does nothing when the
/// administrator already exists.
pub(crate) fn seed_demo_data<S>(store: &S) -> Result<Option<User>, RepositoryError>
where
    S: UserRepository + KycRepository,
{
    if store.find_user_by_email(DEMO_EMAIL)?.is_some() {
        return Ok(None);
    }

    let admin = store.insert_user(NewUser {
        email: DEMO_EMAIL.to_string(),
        password: DEMO_PASSWORD.to_string(),
        full_name: "Demo User".to_string(),
        role: Role::Admin,
    })?;

    for request in sample_requests(&admin) {
        store.insert_request(request)?;
    }

    info!(user_id = %admin.id, "demo data seeded");
    Ok(Some(admin))
}

fn personal(name: &str, email: &str, phone: &str, dob: &str, address: &str) -> PersonalInfo {
    PersonalInfo {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
        dob: Some(dob.to_string()),
        address: Some(address.to_string()),
        ..PersonalInfo::default()
    }
}

fn sample_requests(owner: &User) -> [NewKycRequest; 3] {
    let mut match_scores = BTreeMap::new();
    match_scores.insert("name".to_string(), json!(0.94));
    match_scores.insert("dob".to_string(), json!(0.91));

    let flagged = NewKycRequest {
        status: KycStatus::NeedsReview,
        risk_level: Some(RiskLevel::Medium),
        confidence_score: 82,
        ai_explanation: Some(
            "The identity document appears valid, but location mismatch and device behavior anomalies require manual review."
                .to_string(),
        ),
        current_step: LAST_STEP,
        data: KycData {
            personal_info: Some(personal(
                "Amit Sharma",
                "amit.sharma@example.com",
                "+91 98765 43210",
                "1990-05-15",
                "123, Tech Park Road, Bangalore",
            )),
            documents: Some(DocumentInfo {
                document_type: Some("Passport".to_string()),
                extracted_data: Some(match_scores),
                ..DocumentInfo::default()
            }),
            biometrics: None,
            signals: Some(Signals {
                device: Some("Unknown Android Device".to_string()),
                location: Some("Mumbai, India".to_string()),
                ip_reputation: Some("Suspicious Proxy".to_string()),
                ..Signals::default()
            }),
            ..KycData::default()
        },
        ..NewKycRequest::for_user(owner.id, "KYC-2025-001")
    };

    let verified = NewKycRequest {
        status: KycStatus::Verified,
        risk_level: Some(RiskLevel::Low),
        confidence_score: 98,
        ai_explanation: Some(
            "All biometric and document signals match. No risk flags detected.".to_string(),
        ),
        current_step: LAST_STEP,
        data: KycData {
            personal_info: Some(personal(
                "Sarah Jenkins",
                "sarah.j@example.com",
                "+1 555 0123",
                "1988-11-22",
                "456 Maple Ave, Seattle, WA",
            )),
            documents: Some(DocumentInfo {
                document_type: Some("Driver's License".to_string()),
                ..DocumentInfo::default()
            }),
            ..KycData::default()
        },
        ..NewKycRequest::for_user(owner.id, "KYC-2025-002")
    };

    let in_progress = NewKycRequest {
        ai_explanation: Some("Awaiting document upload.".to_string()),
        current_step: 2,
        data: KycData {
            personal_info: Some(personal(
                "Rahul Verma",
                "rahul.v@example.com",
                "+91 99999 88888",
                "1995-02-10",
                "789 Residency Rd, Hyderabad",
            )),
            ..KycData::default()
        },
        ..NewKycRequest::for_user(owner.id, "KYC-2025-003")
    };

    [flagged, verified, in_progress]
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_kyc::kyc::AdminStats;
    use aegis_kyc::storage::memory::InMemoryStore;

    #[test]
    fn seeding_creates_admin_and_samples_once() {
        let store = InMemoryStore::default();

        let admin = seed_demo_data(&store)
            .expect("seed succeeds")
            .expect("admin created");
        assert!(admin.is_admin());
        assert!(seed_demo_data(&store).expect("reseed succeeds").is_none());

        let requests = store.list_requests().expect("list");
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|request| request.user_id == admin.id));

        let stats = AdminStats::from_requests(&requests);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.review_required, 1);
    }

    #[test]
    fn flagged_sample_carries_signals() {
        let store = InMemoryStore::default();
        seed_demo_data(&store).expect("seed succeeds");

        let flagged = store
            .list_requests()
            .expect("list")
            .into_iter()
            .find(|request| request.kyc_id == "KYC-2025-001")
            .expect("sample present");
        let signals = flagged.data.signals.expect("signals");
        assert_eq!(signals.ip_reputation.as_deref(), Some("Suspicious Proxy"));
        assert_eq!(flagged.risk_level, Some(RiskLevel::Medium));
    }
}
