use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};

use crate::contract::{api, ValidatedJson};
use crate::error::ApiError;
use crate::identity::{Credentials, IdentityService, NewUser, User, UserId};
use crate::kyc::{
    AdminStats, KycRequest, KycRequestId, KycRequestPatch, KycService, NewKycRequest,
    ReviewDecision, StepOutcome, StepSubmission, VerificationEngine, WizardState,
};
use crate::session::ACTOR_HEADER;
use crate::storage::{KycRepository, UserRepository};

/// Shared handler state.
pub struct ApiState<U, K, V> {
    pub identity: Arc<IdentityService<U>>,
    pub kyc: Arc<KycService<K, V>>,
}

impl<U, K, V> Clone for ApiState<U, K, V> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            kyc: self.kyc.clone(),
        }
    }
}

/// Router exposing every contract route.
pub fn api_router<U, K, V>(
    identity: Arc<IdentityService<U>>,
    kyc: Arc<KycService<K, V>>,
) -> Router
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    Router::new()
        .route(api::auth::LOGIN.path, post(login_handler::<U, K, V>))
        .route(api::auth::SIGNUP.path, post(signup_handler::<U, K, V>))
        .route(
            api::kyc::LIST.path,
            get(list_handler::<U, K, V>).post(create_handler::<U, K, V>),
        )
        .route(
            api::kyc::GET.path,
            get(get_handler::<U, K, V>).put(update_handler::<U, K, V>),
        )
        .route(api::kyc::REVIEW.path, post(review_handler::<U, K, V>))
        .route(api::kyc::WIZARD.path, get(wizard_handler::<U, K, V>))
        .route(api::kyc::ADVANCE.path, post(advance_handler::<U, K, V>))
        .route(api::admin::STATS.path, get(stats_handler::<U, K, V>))
        .with_state(ApiState { identity, kyc })
}

/// Acting user id taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid X-User-Id header".to_string())
            })?;

        Ok(ActorId(UserId(id)))
    }
}

fn parse_request_id(raw: &str) -> Result<KycRequestId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(KycRequestId)
        .map_err(|_| ApiError::BadRequest(format!("Invalid request id '{raw}'")))
}

fn resolve_actor<U, K, V>(state: &ApiState<U, K, V>, actor: ActorId) -> Result<User, ApiError>
where
    U: UserRepository + 'static,
{
    Ok(state.identity.get(actor.0)?)
}

pub(crate) async fn login_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Json<User>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    Ok(Json(state.identity.login(&credentials)?))
}

pub(crate) async fn signup_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    ValidatedJson(new_user): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let user = state.identity.signup(new_user)?;
    Ok((api::auth::SIGNUP.success, Json(user)))
}

pub(crate) async fn list_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
) -> Result<Json<Vec<KycRequest>>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    Ok(Json(state.kyc.list()?))
}

pub(crate) async fn get_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    Path(raw_id): Path<String>,
) -> Result<Json<KycRequest>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let id = parse_request_id(&raw_id)?;
    Ok(Json(state.kyc.get(id)?))
}

pub(crate) async fn create_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    ValidatedJson(request): ValidatedJson<NewKycRequest>,
) -> Result<(StatusCode, Json<KycRequest>), ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let created = state.kyc.create(request)?;
    Ok((api::kyc::CREATE.success, Json(created)))
}

pub(crate) async fn update_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    Path(raw_id): Path<String>,
    ValidatedJson(patch): ValidatedJson<KycRequestPatch>,
) -> Result<Json<KycRequest>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let id = parse_request_id(&raw_id)?;
    Ok(Json(state.kyc.update(id, patch)?))
}

pub(crate) async fn review_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    actor: ActorId,
    Path(raw_id): Path<String>,
    ValidatedJson(decision): ValidatedJson<ReviewDecision>,
) -> Result<Json<KycRequest>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let id = parse_request_id(&raw_id)?;
    let reviewer = resolve_actor(&state, actor)?;
    Ok(Json(state.kyc.review(&reviewer, id, decision.action)?))
}

pub(crate) async fn wizard_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    actor: ActorId,
) -> Result<Json<WizardState>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let user = resolve_actor(&state, actor)?;
    Ok(Json(state.kyc.wizard_state(&user)?))
}

pub(crate) async fn advance_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
    actor: ActorId,
    ValidatedJson(submission): ValidatedJson<StepSubmission>,
) -> Result<Json<StepOutcome>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    let user = resolve_actor(&state, actor)?;
    Ok(Json(state.kyc.advance(&user, submission)?))
}

pub(crate) async fn stats_handler<U, K, V>(
    State(state): State<ApiState<U, K, V>>,
) -> Result<Json<AdminStats>, ApiError>
where
    U: UserRepository + 'static,
    K: KycRepository + 'static,
    V: VerificationEngine + 'static,
{
    Ok(Json(state.kyc.stats()?))
}
