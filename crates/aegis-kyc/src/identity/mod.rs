//! Accounts, signup, and credential checks.

pub mod domain;
pub mod service;

pub use domain::{Credentials, NewUser, Role, User, UserId};
pub use service::{IdentityError, IdentityService};
