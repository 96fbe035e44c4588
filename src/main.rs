mod app;
mod auth;
mod bootstrap;
mod config;
mod db;
mod error;
mod state;
mod users;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "doorman=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Configuration, key and database failures abort startup here.
    let config = AppConfig::from_env()?;
    let app_state = AppState::init(&config).await?;
    bootstrap::seed_admin(&app_state.users, &config.bootstrap).await?;

    let app = app::build_app(app_state);
    app::serve(app, config.listen_addr).await
}
