use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

/// Where the signing material comes from.
#[derive(Debug, Clone, Deserialize)]
pub enum SigningMaterial {
    /// PEM-encoded RSA key pair, signs with RS256.
    RsaPem {
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },
    /// Shared secret, signs with HS256.
    Secret(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub signing: SigningMaterial,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub enum StoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
        acquire_timeout_secs: u64,
    },
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    pub username: String,
    pub firstname: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub store: StoreConfig,
    pub jwt: JwtConfig,
    pub hasher: HasherConfig,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_addr: SocketAddr = format!(
            "{}:{}",
            env_or("APP_HOST", "0.0.0.0"),
            env_or("APP_PORT", "5000")
        )
        .parse()
        .context("APP_HOST/APP_PORT do not form a socket address")?;

        let store = match env_or("USER_STORE", "postgres").as_str() {
            "postgres" => StoreConfig::Postgres {
                database_url: database_url_from_env()?,
                max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 10)?,
                acquire_timeout_secs: env_parsed("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?,
            },
            "memory" => StoreConfig::Memory,
            other => bail!("USER_STORE must be `postgres` or `memory`, got `{other}`"),
        };

        let signing = match (
            std::env::var("JWT_PRIVATE_KEY_PATH").ok(),
            std::env::var("JWT_PUBLIC_KEY_PATH").ok(),
            std::env::var("JWT_SECRET").ok(),
        ) {
            (Some(private_key_path), Some(public_key_path), _) => SigningMaterial::RsaPem {
                private_key_path: private_key_path.into(),
                public_key_path: public_key_path.into(),
            },
            (None, None, Some(secret)) if !secret.is_empty() => SigningMaterial::Secret(secret),
            (Some(_), None, _) | (None, Some(_), _) => {
                bail!("JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH must be set together")
            }
            _ => bail!("no signing material: set JWT_PRIVATE_KEY_PATH/JWT_PUBLIC_KEY_PATH or JWT_SECRET"),
        };

        let ttl_minutes: i64 = env_parsed("JWT_TTL_MINUTES", 360)?;
        if ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive, got {ttl_minutes}");
        }

        let jwt = JwtConfig {
            signing,
            issuer: env_or("JWT_ISSUER", "doorman"),
            audience: env_or("JWT_AUDIENCE", "doorman-users"),
            ttl_minutes,
        };

        let defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: env_parsed("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_parsed("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: env_parsed("ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        let bootstrap = BootstrapConfig {
            username: env_or("BOOTSTRAP_ADMIN_USERNAME", "admin"),
            firstname: env_or("BOOTSTRAP_ADMIN_FIRSTNAME", "Administrator"),
            password: std::env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .ok()
                .filter(|p| !p.is_empty()),
        };

        Ok(Self {
            listen_addr,
            store,
            jwt,
            hasher,
            bootstrap,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse::<T>().with_context(|| format!("{key} is not valid: {v}")),
        Err(_) => Ok(default),
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the split
/// `DATABASE_*` variables.
fn database_url_from_env() -> anyhow::Result<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Ok(url);
    }
    let user = std::env::var("DATABASE_USERNAME").context("DATABASE_URL or DATABASE_USERNAME")?;
    let password = std::env::var("DATABASE_PASSWORD").context("DATABASE_PASSWORD")?;
    let host = std::env::var("DATABASE_HOST").context("DATABASE_HOST")?;
    let port = env_or("DATABASE_PORT", "5432");
    let database = std::env::var("DATABASE").context("DATABASE")?;
    Ok(format!("postgres://{user}:{password}@{host}:{port}/{database}"))
}
