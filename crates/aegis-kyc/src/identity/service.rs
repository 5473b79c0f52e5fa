use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Credentials, NewUser, User, UserId};
use crate::storage::{RepositoryError, UserRepository};

/// Signup and credential checks over the user store.
pub struct IdentityService<U> {
    repository: Arc<U>,
}

impl<U> IdentityService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(repository: Arc<U>) -> Self {
        Self { repository }
    }

    /// Match credentials by exact equality. Unknown email and wrong password fail identically.
    pub fn login(&self, credentials: &Credentials) -> Result<User, IdentityError> {
        match self.repository.find_user_by_email(&credentials.email)? {
            Some(user) if user.password == credentials.password => {
                info!(user_id = %user.id, role = user.role.label(), "login accepted");
                Ok(user)
            }
            _ => {
                warn!("login rejected");
                Err(IdentityError::InvalidCredentials)
            }
        }
    }

    pub fn signup(&self, new_user: NewUser) -> Result<User, IdentityError> {
        if self
            .repository
            .find_user_by_email(&new_user.email)?
            .is_some()
        {
            return Err(IdentityError::EmailTaken);
        }

        let user = match self.repository.insert_user(new_user) {
            Ok(user) => user,
            Err(RepositoryError::Conflict) => return Err(IdentityError::EmailTaken),
            Err(other) => return Err(other.into()),
        };

        info!(user_id = %user.id, role = user.role.label(), "account created");
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> Result<User, IdentityError> {
        self.repository
            .fetch_user(id)?
            .ok_or(IdentityError::UnknownUser(id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailTaken,
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
