use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use refnet_shared::{NewUser, UserPatch};
use refnet_store::User;

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath};

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state
        .run("Failed to fetch users", |repo| repo.list_users())
        .await?;
    Ok(Json(users))
}

pub(super) async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, ServerError> {
    state
        .run("Failed to fetch user", move |repo| repo.get_user(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("User"))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    input.validate()?;
    let user = state
        .run("Failed to create user", move |repo| repo.create_user(input))
        .await?;

    info!(id = user.id, username = %user.username, role = %user.role, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>, ServerError> {
    patch.validate()?;
    let user = state
        .run("Failed to update user", move |repo| repo.update_user(id, patch))
        .await?
        .ok_or(ServerError::NotFound("User"))?;

    info!(id, "User updated");
    Ok(Json(user))
}
