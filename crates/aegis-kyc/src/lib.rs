//! Identity verification (KYC) intake: the shared route contract, the applicant wizard, the
//! admin review workflow, and the storage seams they run against.

pub mod clock;
pub mod config;
pub mod contract;
pub mod error;
pub mod identity;
pub mod kyc;
pub mod router;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use router::api_router;
