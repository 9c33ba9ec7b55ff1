use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use refnet_shared::constants::{DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT};
use refnet_shared::NewActivity;
use refnet_store::Activity;

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiQuery};

#[derive(Debug, Default, Deserialize)]
pub(super) struct FeedQuery {
    limit: Option<usize>,
}

pub(super) async fn recent(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<Vec<Activity>>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    if !(1..=MAX_ACTIVITY_LIMIT).contains(&limit) {
        return Err(ServerError::BadRequest(format!(
            "limit must be between 1 and {MAX_ACTIVITY_LIMIT}"
        )));
    }

    let activities = state
        .run("Failed to fetch activities", move |repo| repo.recent_activities(limit))
        .await?;
    Ok(Json(activities))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewActivity>,
) -> Result<(StatusCode, Json<Activity>), ServerError> {
    input.validate()?;
    let activity = state
        .run("Failed to create activity", move |repo| repo.create_activity(input))
        .await?;

    debug!(id = activity.id, kind = %activity.kind, "Activity recorded");
    Ok((StatusCode::CREATED, Json(activity)))
}
