use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;

use crate::{
    auth::{gate::AuthorizationGate, jwt::JwtKeys, password::PasswordHasher, services::Authenticator},
    config::{AppConfig, StoreConfig},
    db,
    users::{
        memory::MemoryUserRepo,
        repo::{PgUserRepo, UserRepo},
        services::UserStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub authenticator: Arc<Authenticator>,
    pub keys: Arc<JwtKeys>,
}

impl FromRef<AppState> for AuthorizationGate {
    fn from_ref(state: &AppState) -> Self {
        AuthorizationGate::new(state.keys.clone())
    }
}

impl AppState {
    /// Builds everything that lives for the whole process. Any error here is fatal.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let hasher = Arc::new(
            PasswordHasher::new(&config.hasher).context("configure password hasher")?,
        );

        let repo: Arc<dyn UserRepo> = match &config.store {
            StoreConfig::Postgres {
                database_url,
                max_connections,
                acquire_timeout_secs,
            } => {
                let pool = db::connect(database_url, *max_connections, *acquire_timeout_secs).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserRepo::new(pool))
            }
            StoreConfig::Memory => {
                tracing::warn!("using in-memory user store; data is lost on exit");
                Arc::new(MemoryUserRepo::new())
            }
        };

        let keys = Arc::new(JwtKeys::from_config(&config.jwt).context("load signing keys")?);
        Self::from_parts(repo, hasher, keys)
    }

    pub fn from_parts(
        repo: Arc<dyn UserRepo>,
        hasher: Arc<PasswordHasher>,
        keys: Arc<JwtKeys>,
    ) -> anyhow::Result<Self> {
        let users = UserStore::new(repo, hasher.clone());
        let authenticator =
            Arc::new(Authenticator::new(users.clone(), hasher).context("prepare authenticator")?);
        Ok(Self {
            users,
            authenticator,
            keys,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(crate::auth::password::cheap_hasher()),
            Arc::new(crate::auth::jwt::test_keys("test", "doorman", "doorman-users")),
        )
        .expect("fake state builds")
    }
}
