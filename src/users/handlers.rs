use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{DeleteUserRequest, RegisterRequest, UpdateUserRequest},
    repo_types::User,
};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/:id", get(get_user))
        .route("/users/list", get(list_users))
        .route("/user", put(update_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let candidate = payload.validate()?;
    let user = state.users.create(candidate).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, caller), fields(caller = %caller.0.sub))]
pub async fn get_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state.users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

#[instrument(skip(state, caller), fields(caller = %caller.0.sub))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list().await?))
}

#[instrument(skip(state, caller, payload), fields(caller = %caller.0.sub))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let (id, changes) = payload.validate()?;
    state.users.update(id, changes).await?;
    info!(user_id = %id, by = %caller.0.sub, "profile updated");
    Ok(Json(json!({ "id": id, "updated": true })))
}

#[instrument(skip(state, caller, payload), fields(caller = %caller.0.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<Json<Value>, AppError> {
    state.users.soft_delete(payload.id).await?;
    info!(user_id = %payload.id, by = %caller.0.sub, "user deleted");
    Ok(Json(json!({ "id": payload.id, "deleted": true })))
}
