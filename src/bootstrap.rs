use anyhow::Context;
use tracing::{info, warn};

use crate::{
    config::BootstrapConfig,
    error::AppError,
    users::{repo_types::NewUser, services::UserStore},
};

/// Seeds the administrative account if it is not there yet.
pub async fn seed_admin(users: &UserStore, cfg: &BootstrapConfig) -> anyhow::Result<()> {
    let Some(password) = cfg.password.clone() else {
        warn!("BOOTSTRAP_ADMIN_PASSWORD not set; skipping admin seeding");
        return Ok(());
    };

    let candidate = NewUser {
        firstname: cfg.firstname.clone(),
        lastname: String::new(),
        username: cfg.username.clone(),
        password,
    };
    match users.create(candidate).await {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "admin account seeded");
            Ok(())
        }
        Err(AppError::Conflict) => {
            info!(username = %cfg.username, "admin account already present");
            Ok(())
        }
        Err(e) => Err(e).context("seed admin account"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::services::memory_store;

    fn cfg(password: Option<&str>) -> BootstrapConfig {
        cfg_for("admin", password)
    }

    fn cfg_for(username: &str, password: Option<&str>) -> BootstrapConfig {
        BootstrapConfig {
            username: username.into(),
            firstname: "Administrator".into(),
            password: password.map(Into::into),
        }
    }

    #[tokio::test]
    async fn seeds_once() {
        let (store, _) = memory_store();
        seed_admin(&store, &cfg(Some("doorman"))).await.unwrap();
        seed_admin(&store, &cfg(Some("doorman"))).await.unwrap();

        let users = store.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].firstname, "Administrator");
    }

    #[tokio::test]
    async fn skips_without_password() {
        let (store, _) = memory_store();
        seed_admin(&store, &cfg(None)).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_admin_username_fails_startup() {
        let (store, _) = memory_store();
        let err = seed_admin(&store, &cfg_for("", Some("doorman")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("seed admin account"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
