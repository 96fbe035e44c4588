use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::is_valid_username,
    repo::UserRepo,
    repo_types::{NewUser, RecordChanges, User, UserChanges, UserRecord},
};
use crate::{auth::password::PasswordHasher, error::AppError};

/// User lifecycle on top of a [`UserRepo`]. The only place passwords get hashed.
#[derive(Clone)]
pub struct UserStore {
    repo: Arc<dyn UserRepo>,
    hasher: Arc<PasswordHasher>,
}

impl UserStore {
    pub fn new(repo: Arc<dyn UserRepo>, hasher: Arc<PasswordHasher>) -> Self {
        Self { repo, hasher }
    }

    async fn hash(&self, plain: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
            .map_err(AppError::from)
    }

    /// Assigns `id` and `created_at`, hashes the password and persists the row.
    pub async fn create(&self, candidate: NewUser) -> Result<User, AppError> {
        if !is_valid_username(&candidate.username) {
            return Err(AppError::BadRequest("invalid username".into()));
        }
        let password_hash = self.hash(candidate.password).await?;
        let record = UserRecord {
            id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            deleted_at: None,
            firstname: candidate.firstname,
            lastname: candidate.lastname,
            username: candidate.username,
            password_hash,
        };
        let created = self.repo.insert(record).await?;
        info!(user_id = %created.id, username = %created.username, "user created");
        Ok(created.into())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.repo.find_by_id(id).await?.map(User::from))
    }

    /// Full row including the hash; reserved for the authentication path.
    pub(crate) async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        Ok(self.repo.find_by_username(username).await?)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let rows = self.repo.list().await?;
        debug!(count = rows.len(), "users listed");
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<(), AppError> {
        if let Some(username) = &changes.username {
            if !is_valid_username(username) {
                return Err(AppError::BadRequest("invalid username".into()));
            }
        }
        let password_hash = match changes.password {
            Some(plain) => Some(self.hash(plain).await?),
            None => None,
        };
        let changes = RecordChanges {
            updated_at: OffsetDateTime::now_utc(),
            firstname: changes.firstname,
            lastname: changes.lastname,
            username: changes.username,
            password_hash,
        };
        let rehashed = changes.password_hash.is_some();
        self.repo.update(id, changes).await?;
        info!(user_id = %id, rehashed, "user updated");
        Ok(())
    }

    /// A second call on the same id is `NotFound`.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repo.soft_delete(id, OffsetDateTime::now_utc()).await?;
        info!(user_id = %id, "user soft-deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn memory_store() -> (UserStore, Arc<super::memory::MemoryUserRepo>) {
    let repo = Arc::new(super::memory::MemoryUserRepo::new());
    let store = UserStore::new(
        repo.clone(),
        Arc::new(crate::auth::password::cheap_hasher()),
    );
    (store, repo)
}
