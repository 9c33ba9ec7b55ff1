use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use refnet_shared::{DisputePatch, DisputeStatus, NewDispute};
use refnet_store::Dispute;

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Default, Deserialize)]
pub(super) struct DisputeFilter {
    status: Option<DisputeStatus>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<DisputeFilter>,
) -> Result<Json<Vec<Dispute>>, ServerError> {
    let disputes = state
        .run("Failed to fetch disputes", move |repo| match filter.status {
            Some(status) => repo.disputes_by_status(status),
            None => repo.list_disputes(),
        })
        .await?;

    Ok(Json(disputes))
}

pub(super) async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Dispute>, ServerError> {
    state
        .run("Failed to fetch dispute", move |repo| repo.get_dispute(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("Dispute"))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewDispute>,
) -> Result<(StatusCode, Json<Dispute>), ServerError> {
    input.validate()?;
    let dispute = state
        .run("Failed to create dispute", move |repo| repo.create_dispute(input))
        .await?;

    info!(id = dispute.id, case_id = %dispute.case_id, "Dispute filed");
    Ok((StatusCode::CREATED, Json(dispute)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<DisputePatch>,
) -> Result<Json<Dispute>, ServerError> {
    patch.validate()?;
    let dispute = state
        .run("Failed to update dispute", move |repo| repo.update_dispute(id, patch))
        .await?
        .ok_or(ServerError::NotFound("Dispute"))?;

    info!(id, case_id = %dispute.case_id, status = %dispute.status, "Dispute updated");
    Ok(Json(dispute))
}
