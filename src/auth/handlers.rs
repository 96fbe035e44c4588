use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{AuthToken, LoginRequest},
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/user/login", post(login))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthToken>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        warn!("blank username or password");
        return Err(AppError::BadRequest(
            "username and password cannot be blank".into(),
        ));
    }

    // A failed authentication returns here; no token is issued for it.
    let identity = state
        .authenticator
        .authenticate(username, &payload.password)
        .await?;

    let token = state.keys.issue(&identity, state.keys.ttl())?;

    info!(user_id = %identity.id, "user logged in");
    Ok(Json(AuthToken { token }))
}
