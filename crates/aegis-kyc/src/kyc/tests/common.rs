use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::identity::{IdentityService, NewUser, Role, User, UserId};
use crate::kyc::domain::{KycRequest, KycRequestId, NewKycRequest};
use crate::kyc::scoring::StubVerificationEngine;
use crate::kyc::KycService;
use crate::storage::memory::InMemoryStore;
use crate::storage::{KycRepository, RepositoryError, UserRepository};

pub(super) type Service = KycService<InMemoryStore, StubVerificationEngine>;

pub(super) fn instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 3, 14, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn store() -> InMemoryStore {
    InMemoryStore::with_clock(Arc::new(FixedClock(instant())))
}

pub(super) fn service_over(store: &InMemoryStore) -> Service {
    KycService::with_clock(
        Arc::new(store.clone()),
        Arc::new(StubVerificationEngine),
        Arc::new(FixedClock(instant())),
    )
}

pub(super) fn build_service() -> (Service, InMemoryStore) {
    let store = store();
    (service_over(&store), store)
}

pub(super) fn add_user(store: &InMemoryStore, email: &str, role: Role) -> User {
    store
        .insert_user(NewUser {
            email: email.to_string(),
            password: "password".to_string(),
            full_name: format!("{} Example", role.label()),
            role,
        })
        .expect("user inserted")
}

pub(super) fn applicant(store: &InMemoryStore) -> User {
    add_user(store, "applicant@example.com", Role::User)
}

pub(super) fn admin(store: &InMemoryStore) -> User {
    add_user(store, "admin@example.com", Role::Admin)
}

pub(super) fn seeded_request(store: &InMemoryStore, user_id: UserId, kyc_id: &str) -> KycRequest {
    store
        .insert_request(NewKycRequest::for_user(user_id, kyc_id))
        .expect("request inserted")
}

pub(super) fn identity_over(store: &InMemoryStore) -> IdentityService<InMemoryStore> {
    IdentityService::new(Arc::new(store.clone()))
}

pub(super) fn api_over(store: &InMemoryStore) -> axum::Router {
    crate::router::api_router(Arc::new(identity_over(store)), Arc::new(service_over(store)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store whose every call fails, for error mapping checks.
pub(super) struct UnavailableStore;

impl KycRepository for UnavailableStore {
    fn insert_request(&self, _request: NewKycRequest) -> Result<KycRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_request(&self, _id: KycRequestId) -> Result<Option<KycRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_requests(&self) -> Result<Vec<KycRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn requests_for_user(&self, _user_id: UserId) -> Result<Vec<KycRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_request(&self, _request: KycRequest) -> Result<KycRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
