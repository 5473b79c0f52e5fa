//! Persistence seams for accounts and verification requests.
//!
//! The relational store sits behind these traits; `memory` ships the adapter used by the
//! service binary and the test suites.

pub mod memory;

use crate::identity::{NewUser, User, UserId};
use crate::kyc::domain::{KycRequest, KycRequestId, NewKycRequest};

pub trait UserRepository: Send + Sync {
    /// Assigns the id and creation timestamp. Emails are unique.
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

pub trait KycRepository: Send + Sync {
    /// Assigns the id, timestamps, and the initial version.
    fn insert_request(&self, request: NewKycRequest) -> Result<KycRequest, RepositoryError>;
    fn fetch_request(&self, id: KycRequestId) -> Result<Option<KycRequest>, RepositoryError>;
    /// Every request, newest created first.
    fn list_requests(&self) -> Result<Vec<KycRequest>, RepositoryError>;
    /// Requests owned by one user, newest created first.
    fn requests_for_user(&self, user_id: UserId) -> Result<Vec<KycRequest>, RepositoryError>;
    /// Compare-and-swap on `version`: the record must carry the version it was read at.
    fn update_request(&self, request: KycRequest) -> Result<KycRequest, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently (read version {expected}, stored version {actual})")]
    VersionMismatch { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
