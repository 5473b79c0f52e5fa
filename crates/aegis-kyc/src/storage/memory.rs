use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{KycRepository, RepositoryError, UserRepository};
use crate::clock::{Clock, SystemClock};
use crate::identity::{NewUser, User, UserId};
use crate::kyc::domain::{KycRequest, KycRequestId, NewKycRequest};

/// Mutex-guarded store holding both collections. Clones share the same data.
#[derive(Clone)]
pub struct InMemoryStore {
    users: Arc<Mutex<Table<UserId, User>>>,
    requests: Arc<Mutex<Table<KycRequestId, KycRequest>>>,
    clock: Arc<dyn Clock>,
}

struct Table<K, V> {
    rows: BTreeMap<K, V>,
    next_id: i64,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<K, V> Table<K, V> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl InMemoryStore {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Arc::default(),
            requests: Arc::default(),
            clock,
        }
    }

    fn users(&self) -> Result<MutexGuard<'_, Table<UserId, User>>, RepositoryError> {
        self.users
            .lock()
            .map_err(|_| RepositoryError::Unavailable("user table lock poisoned".to_string()))
    }

    fn requests(&self) -> Result<MutexGuard<'_, Table<KycRequestId, KycRequest>>, RepositoryError> {
        self.requests
            .lock()
            .map_err(|_| RepositoryError::Unavailable("request table lock poisoned".to_string()))
    }
}

fn newest_first(requests: &mut [KycRequest]) {
    requests.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl UserRepository for InMemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.users()?;
        if table.rows.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }

        let id = UserId(table.allocate());
        let stored = User {
            id,
            email: user.email,
            password: user.password,
            full_name: user.full_name,
            role: user.role,
            created_at: self.clock.now(),
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users()?.rows.get(&id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users()?
            .rows
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}

impl KycRepository for InMemoryStore {
    fn insert_request(&self, request: NewKycRequest) -> Result<KycRequest, RepositoryError> {
        let mut table = self.requests()?;
        let id = KycRequestId(table.allocate());
        let now = self.clock.now();

        let stored = KycRequest {
            id,
            user_id: request.user_id,
            kyc_id: request.kyc_id,
            status: request.status,
            risk_level: request.risk_level,
            confidence_score: request.confidence_score,
            ai_explanation: request.ai_explanation,
            current_step: request.current_step,
            data: request.data,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch_request(&self, id: KycRequestId) -> Result<Option<KycRequest>, RepositoryError> {
        Ok(self.requests()?.rows.get(&id).cloned())
    }

    fn list_requests(&self) -> Result<Vec<KycRequest>, RepositoryError> {
        let mut requests: Vec<KycRequest> = self.requests()?.rows.values().cloned().collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    fn requests_for_user(&self, user_id: UserId) -> Result<Vec<KycRequest>, RepositoryError> {
        let mut requests: Vec<KycRequest> = self
            .requests()?
            .rows
            .values()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    fn update_request(&self, mut request: KycRequest) -> Result<KycRequest, RepositoryError> {
        let mut table = self.requests()?;
        let stored = table
            .rows
            .get_mut(&request.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.version != request.version {
            return Err(RepositoryError::VersionMismatch {
                expected: request.version,
                actual: stored.version,
            });
        }

        request.created_at = stored.created_at;
        request.updated_at = self.clock.now();
        request.version += 1;
        *stored = request.clone();
        Ok(request)
    }
}
