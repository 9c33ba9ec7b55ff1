use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use refnet_shared::{CampaignPatch, NewCampaign, NewConversion};
use refnet_store::{Campaign, Earning};

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CampaignFilter {
    business_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct Conversion {
    campaign: Campaign,
    earning: Earning,
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CampaignFilter>,
) -> Result<Json<Vec<Campaign>>, ServerError> {
    let campaigns = state
        .run("Failed to fetch campaigns", move |repo| match filter.business_id {
            Some(business_id) => repo.campaigns_by_business(business_id),
            None => repo.list_campaigns(),
        })
        .await?;

    Ok(Json(campaigns))
}

pub(super) async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Campaign>, ServerError> {
    state
        .run("Failed to fetch campaign", move |repo| repo.get_campaign(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("Campaign"))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ServerError> {
    input.validate()?;
    let campaign = state
        .run("Failed to create campaign", move |repo| repo.create_campaign(input))
        .await?;

    info!(
        id = campaign.id,
        business_id = ?campaign.business_id,
        max_budget = %campaign.max_budget,
        "Campaign created"
    );
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<CampaignPatch>,
) -> Result<Json<Campaign>, ServerError> {
    patch.validate()?;
    let campaign = state
        .run("Failed to update campaign", move |repo| repo.update_campaign(id, patch))
        .await?
        .ok_or(ServerError::NotFound("Campaign"))?;

    info!(id, status = %campaign.status, "Campaign updated");
    Ok(Json(campaign))
}

pub(super) async fn record_conversion(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NewConversion>,
) -> Result<(StatusCode, Json<Conversion>), ServerError> {
    input.validate()?;
    let (campaign, earning) = state
        .run("Failed to record conversion", move |repo| repo.record_conversion(id, input))
        .await?
        .ok_or(ServerError::NotFound("Campaign"))?;

    info!(
        campaign_id = campaign.id,
        earning_id = earning.id,
        amount = %earning.amount,
        budget_used = %campaign.budget_used,
        "Conversion recorded"
    );
    Ok((StatusCode::CREATED, Json(Conversion { campaign, earning })))
}
