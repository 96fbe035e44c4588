use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserRepo},
    repo_types::{RecordChanges, UserRecord},
};

/// Process-local repo for development and tests. Rows are never removed.
#[derive(Default)]
pub struct MemoryUserRepo {
    rows: RwLock<Vec<UserRecord>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a row whether or not it was soft-deleted.
    #[cfg(test)]
    pub fn find_any(&self, id: Uuid) -> Option<UserRecord> {
        self.rows.read().iter().find(|r| r.id == id).cloned()
    }
}

fn username_taken(rows: &[UserRecord], username: &str, except: Option<Uuid>) -> bool {
    rows.iter()
        .any(|r| r.is_active() && r.username == username && Some(r.id) != except)
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert(&self, record: UserRecord) -> Result<UserRecord, StoreError> {
        let mut rows = self.rows.write();
        if username_taken(&rows, &record.username, None) {
            return Err(StoreError::Conflict);
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|r| r.is_active() && r.id == id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|r| r.is_active() && r.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_active())
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, changes: RecordChanges) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        if !rows.iter().any(|r| r.is_active() && r.id == id) {
            return Err(StoreError::NotFound);
        }
        if let Some(username) = &changes.username {
            if username_taken(&rows, username, Some(id)) {
                return Err(StoreError::Conflict);
            }
        }
        let row = rows
            .iter_mut()
            .find(|r| r.is_active() && r.id == id)
            .ok_or(StoreError::NotFound)?;

        row.updated_at = Some(changes.updated_at);
        if let Some(v) = changes.firstname {
            row.firstname = v;
        }
        if let Some(v) = changes.lastname {
            row.lastname = v;
        }
        if let Some(v) = changes.username {
            row.username = v;
        }
        if let Some(v) = changes.password_hash {
            row.password_hash = v;
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid, at: OffsetDateTime) -> Result<(), StoreError> {
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .find(|r| r.is_active() && r.id == id)
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(at);
        Ok(())
    }
}
