//! Route contract shared by the server router and HTTP clients.
//!
//! Each [`Route`] pins a method, a path template with `:param` segments, the input and output
//! types, and the statuses the route may answer with. The router registers handlers against
//! these same paths so client and server cannot drift.

use std::fmt::{self, Display};
use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::{Method, StatusCode};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// Declarative description of one endpoint.
pub struct Route<I, O> {
    pub method: Method,
    pub path: &'static str,
    pub success: StatusCode,
    pub failures: &'static [StatusCode],
    shape: PhantomData<fn(I) -> O>,
}

impl<I, O> Route<I, O> {
    pub const fn new(
        method: Method,
        path: &'static str,
        success: StatusCode,
        failures: &'static [StatusCode],
    ) -> Self {
        Self {
            method,
            path,
            success,
            failures,
            shape: PhantomData,
        }
    }

    /// Statuses this route documents, success first.
    pub fn statuses(&self) -> Vec<StatusCode> {
        std::iter::once(self.success)
            .chain(self.failures.iter().copied())
            .collect()
    }

    /// Strict URL builder: every placeholder must be supplied.
    pub fn url<K, V>(&self, params: &[(K, V)]) -> Result<String, ContractError>
    where
        K: AsRef<str>,
        V: Display,
    {
        let url = build_url(self.path, params);
        match url.split('/').find_map(|segment| segment.strip_prefix(':')) {
            Some(name) => Err(ContractError::MissingParam {
                path: self.path,
                name: name.to_string(),
            }),
            None => Ok(url),
        }
    }
}

impl<I, O> Clone for Route<I, O> {
    fn clone(&self) -> Self {
        Self::new(self.method.clone(), self.path, self.success, self.failures)
    }
}

impl<I, O> fmt::Debug for Route<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("success", &self.success)
            .finish()
    }
}

/// Substitute `:key` segments with the matching parameter.
///
/// Parameters with no matching segment are ignored; segments with no matching parameter are
/// left as written. Use [`Route::url`] to reject leftovers.
pub fn build_url<K, V>(template: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: Display,
{
    template
        .split('/')
        .map(|segment| {
            segment
                .strip_prefix(':')
                .and_then(|name| params.iter().find(|(key, _)| key.as_ref() == name))
                .map_or_else(|| segment.to_string(), |(_, value)| value.to_string())
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("path {path} is missing parameter '{name}'")]
    MissingParam { path: &'static str, name: String },
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// The endpoint map.
pub mod api {
    use super::Route;
    use axum::http::{Method, StatusCode};

    pub mod auth {
        use super::*;
        use crate::identity::{Credentials, NewUser, User};

        pub const LOGIN: Route<Credentials, User> = Route::new(
            Method::POST,
            "/api/login",
            StatusCode::OK,
            &[StatusCode::BAD_REQUEST, StatusCode::UNAUTHORIZED],
        );

        pub const SIGNUP: Route<NewUser, User> = Route::new(
            Method::POST,
            "/api/signup",
            StatusCode::CREATED,
            &[StatusCode::BAD_REQUEST],
        );
    }

    pub mod kyc {
        use super::*;
        use crate::kyc::{
            KycRequest, KycRequestPatch, NewKycRequest, ReviewDecision, StepOutcome,
            StepSubmission, WizardState,
        };

        pub const LIST: Route<(), Vec<KycRequest>> =
            Route::new(Method::GET, "/api/kyc", StatusCode::OK, &[]);

        pub const GET: Route<(), KycRequest> = Route::new(
            Method::GET,
            "/api/kyc/:id",
            StatusCode::OK,
            &[StatusCode::NOT_FOUND],
        );

        pub const CREATE: Route<NewKycRequest, KycRequest> = Route::new(
            Method::POST,
            "/api/kyc",
            StatusCode::CREATED,
            &[StatusCode::BAD_REQUEST],
        );

        pub const UPDATE: Route<KycRequestPatch, KycRequest> = Route::new(
            Method::PUT,
            "/api/kyc/:id",
            StatusCode::OK,
            &[
                StatusCode::BAD_REQUEST,
                StatusCode::NOT_FOUND,
                StatusCode::CONFLICT,
            ],
        );

        pub const REVIEW: Route<ReviewDecision, KycRequest> = Route::new(
            Method::POST,
            "/api/kyc/:id/review",
            StatusCode::OK,
            &[
                StatusCode::BAD_REQUEST,
                StatusCode::UNAUTHORIZED,
                StatusCode::FORBIDDEN,
                StatusCode::NOT_FOUND,
                StatusCode::CONFLICT,
            ],
        );

        pub const WIZARD: Route<(), WizardState> = Route::new(
            Method::GET,
            "/api/wizard",
            StatusCode::OK,
            &[StatusCode::UNAUTHORIZED],
        );

        pub const ADVANCE: Route<StepSubmission, StepOutcome> = Route::new(
            Method::POST,
            "/api/wizard/advance",
            StatusCode::OK,
            &[
                StatusCode::BAD_REQUEST,
                StatusCode::UNAUTHORIZED,
                StatusCode::CONFLICT,
            ],
        );
    }

    pub mod admin {
        use super::*;
        use crate::kyc::AdminStats;

        pub const STATS: Route<(), AdminStats> =
            Route::new(Method::GET, "/api/admin/stats", StatusCode::OK, &[]);
    }
}

/// Declaration order of a body's validated fields, so the reported error is the one a form
/// shows first. Types without an order report failures by field name.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str] = &[];
}

impl FieldOrder for crate::identity::NewUser {
    const FIELDS: &'static [&'static str] = &["email", "password", "full_name"];
}

impl FieldOrder for crate::identity::Credentials {}

impl FieldOrder for crate::kyc::NewKycRequest {
    const FIELDS: &'static [&'static str] = &["kyc_id", "confidence_score", "current_step"];
}

impl FieldOrder for crate::kyc::KycRequestPatch {
    const FIELDS: &'static [&'static str] = &["kyc_id", "confidence_score", "current_step"];
}

impl FieldOrder for crate::kyc::ReviewDecision {}

impl FieldOrder for crate::kyc::StepSubmission {}

/// JSON body that has been parsed and checked against its `Validate` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate().map_err(|errors| {
            ApiError::BadRequest(first_validation_message(&errors, T::FIELDS))
        })?;
        Ok(Self(value))
    }
}

/// The message of the first failing field. Fields named in `order` come first, in that order;
/// the rest follow by name.
pub fn first_validation_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| {
        field_rank(order, &a.0)
            .cmp(&field_rank(order, &b.0))
            .then_with(|| a.0.cmp(&b.0))
    });

    fields
        .into_iter()
        .find_map(|(field, failures)| {
            failures.first().map(|failure| match &failure.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {field}"),
            })
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

fn field_rank(order: &[&str], field: &str) -> usize {
    order
        .iter()
        .position(|known| *known == field)
        .unwrap_or(order.len())
}
