use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use refnet_shared::{LeadPatch, LeadStatus, NewLead};
use refnet_store::Lead;

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LeadFilter {
    status: Option<LeadStatus>,
    referrer_id: Option<i64>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<LeadFilter>,
) -> Result<Json<Vec<Lead>>, ServerError> {
    let leads = state
        .run("Failed to fetch leads", move |repo| {
            match (filter.referrer_id, filter.status) {
                (Some(referrer_id), status) => repo.leads_by_referrer(referrer_id).map(|leads| {
                    leads
                        .into_iter()
                        .filter(|l| status.map_or(true, |s| l.status == s))
                        .collect()
                }),
                (None, Some(status)) => repo.leads_by_status(status),
                (None, None) => repo.list_leads(),
            }
        })
        .await?;

    Ok(Json(leads))
}

pub(super) async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Lead>, ServerError> {
    state
        .run("Failed to fetch lead", move |repo| repo.get_lead(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("Lead"))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<Lead>), ServerError> {
    input.validate()?;
    let lead = state
        .run("Failed to create lead", move |repo| repo.create_lead(input))
        .await?;

    info!(id = lead.id, referrer_id = ?lead.referrer_id, "Lead created");
    Ok((StatusCode::CREATED, Json(lead)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<LeadPatch>,
) -> Result<Json<Lead>, ServerError> {
    patch.validate()?;
    let lead = state
        .run("Failed to update lead", move |repo| repo.update_lead(id, patch))
        .await?
        .ok_or(ServerError::NotFound("Lead"))?;

    info!(id, status = %lead.status, "Lead updated");
    Ok(Json(lead))
}
