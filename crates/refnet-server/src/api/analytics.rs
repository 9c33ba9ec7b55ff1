use axum::extract::State;
use axum::Json;

use crate::analytics::{self, Overview, ReferrerSummary};
use crate::error::ServerError;
use crate::extract::ApiPath;

use super::AppState;

pub(super) async fn overview(State(state): State<AppState>) -> Result<Json<Overview>, ServerError> {
    let overview = state
        .run("Failed to fetch analytics", |repo| {
            let leads = repo.list_leads()?;
            let campaigns = repo.list_campaigns()?;
            let earnings = repo.list_earnings()?;
            let disputes = repo.list_disputes()?;
            Ok(analytics::overview(&leads, &campaigns, &earnings, &disputes))
        })
        .await?;

    Ok(Json(overview))
}

pub(super) async fn referrer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ReferrerSummary>, ServerError> {
    state
        .run("Failed to fetch referrer analytics", move |repo| {
            if repo.get_user(id)?.is_none() {
                return Ok(None);
            }
            let leads = repo.leads_by_referrer(id)?;
            let earnings = repo.earnings_by_referrer(id)?;
            Ok(Some(analytics::referrer_summary(id, &leads, &earnings)))
        })
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("User"))
}
