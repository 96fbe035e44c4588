use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tracing::{debug, error, warn};

use super::{
    dto::Identity,
    password::{PasswordError, PasswordHasher},
};
use crate::{error::AppError, users::services::UserStore};

/// Turns raw credentials into an [`Identity`]. The only place a raw
/// password is ever compared with a stored hash.
pub struct Authenticator {
    users: UserStore,
    hasher: Arc<PasswordHasher>,
    // Verified against when the username is unknown, so both rejections cost the same.
    dummy_hash: String,
    failed_logins: AtomicU64,
}

impl Authenticator {
    pub fn new(users: UserStore, hasher: Arc<PasswordHasher>) -> Result<Self, PasswordError> {
        let dummy_hash = hasher.hash("doorman-dummy-password")?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
            failed_logins: AtomicU64::new(0),
        })
    }

    #[cfg(test)]
    pub(crate) fn failed_logins(&self) -> u64 {
        self.failed_logins.load(Ordering::Relaxed)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AppError> {
        let record = self.users.find_by_username(username).await?;

        let hash = record
            .as_ref()
            .map(|r| r.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let hasher = self.hasher.clone();
        let plain = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&hash, &plain))
            .await
            .map_err(|e| AppError::Internal(format!("verify task failed: {e}")))?;

        let ok = match verified {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, username, "stored password hash unusable");
                false
            }
        };

        match record {
            Some(r) if ok => {
                debug!(user_id = %r.id, "credentials verified");
                Ok(r.identity())
            }
            _ => {
                let failed = self.failed_logins.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(username, failed_logins = failed, "login rejected");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::password::cheap_hasher,
        users::{repo_types::NewUser, services::memory_store},
    };

    async fn with_alice() -> (Authenticator, UserStore) {
        let (store, _) = memory_store();
        store
            .create(NewUser {
                firstname: "Alice".into(),
                lastname: "Liddell".into(),
                username: "alice".into(),
                password: "s3cret".into(),
            })
            .await
            .unwrap();
        let auth = Authenticator::new(store.clone(), Arc::new(cheap_hasher())).unwrap();
        (auth, store)
    }

    #[tokio::test]
    async fn correct_credentials_yield_identity() {
        let (auth, _) = with_alice().await;
        let who = auth.authenticate("alice", "s3cret").await.expect("authenticated");
        assert_eq!(who.username, "alice");
        assert_eq!(who.display_name(), "Alice Liddell");
        let json = serde_json::to_string(&who).unwrap();
        assert!(!json.contains("password"));
        assert_eq!(auth.failed_logins(), 0);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_identical() {
        let (auth, _) = with_alice().await;
        let wrong = auth.authenticate("alice", "wrong").await.unwrap_err();
        let unknown = auth.authenticate("bob", "anything").await.unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(auth.failed_logins(), 2);
    }

    #[tokio::test]
    async fn deleted_user_cannot_authenticate() {
        let (auth, store) = with_alice().await;
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        store.soft_delete(alice.id).await.unwrap();
        let err = auth.authenticate("alice", "s3cret").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
