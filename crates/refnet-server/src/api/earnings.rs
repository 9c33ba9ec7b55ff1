use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use refnet_shared::{EarningPatch, NewEarning};
use refnet_store::Earning;

use super::AppState;
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath};

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Earning>>, ServerError> {
    let earnings = state
        .run("Failed to fetch earnings", |repo| repo.list_earnings())
        .await?;
    Ok(Json(earnings))
}

pub(super) async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Earning>, ServerError> {
    state
        .run("Failed to fetch earning", move |repo| repo.get_earning(id))
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("Earning"))
}

/// Unknown referrers simply have no earnings.
pub(super) async fn by_referrer(
    State(state): State<AppState>,
    ApiPath(referrer_id): ApiPath<i64>,
) -> Result<Json<Vec<Earning>>, ServerError> {
    let earnings = state
        .run("Failed to fetch referrer earnings", move |repo| {
            repo.earnings_by_referrer(referrer_id)
        })
        .await?;
    Ok(Json(earnings))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewEarning>,
) -> Result<(StatusCode, Json<Earning>), ServerError> {
    input.validate()?;
    let earning = state
        .run("Failed to create earning", move |repo| repo.create_earning(input))
        .await?;

    info!(id = earning.id, amount = %earning.amount, "Earning created");
    Ok((StatusCode::CREATED, Json(earning)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<EarningPatch>,
) -> Result<Json<Earning>, ServerError> {
    patch.validate()?;
    let earning = state
        .run("Failed to update earning", move |repo| repo.update_earning(id, patch))
        .await?
        .ok_or(ServerError::NotFound("Earning"))?;

    info!(id, status = %earning.status, "Earning updated");
    Ok(Json(earning))
}
