//! REST routes under `/api`, one submodule per entity.

mod activities;
mod analytics;
mod campaigns;
mod disputes;
mod earnings;
mod leads;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::Method, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use refnet_shared::constants::API_BASE;
use refnet_store::Repository;

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, config: ServerConfig) -> Self {
        Self {
            repo,
            config: Arc::new(config),
        }
    }

    /// Run a store call on tokio's blocking pool. Store failures map through
    /// [`ServerError::store`] with `context`.
    pub(crate) async fn run<T, F>(&self, context: &'static str, call: F) -> Result<T, ServerError>
    where
        F: FnOnce(&dyn Repository) -> refnet_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        match tokio::task::spawn_blocking(move || call(repo.as_ref())).await {
            Ok(result) => result.map_err(ServerError::store(context)),
            Err(e) => {
                error!(error = %e, "{context}");
                Err(ServerError::Internal(context))
            }
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    let api = Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", get(users::get).patch(users::update))
        .route("/leads", get(leads::list).post(leads::create))
        .route("/leads/{id}", get(leads::get).patch(leads::update))
        .route("/campaigns", get(campaigns::list).post(campaigns::create))
        .route("/campaigns/{id}", get(campaigns::get).patch(campaigns::update))
        .route(
            "/campaigns/{id}/conversions",
            axum::routing::post(campaigns::record_conversion),
        )
        .route("/disputes", get(disputes::list).post(disputes::create))
        .route("/disputes/{id}", get(disputes::get).patch(disputes::update))
        .route("/earnings", get(earnings::list).post(earnings::create))
        .route("/earnings/{id}", get(earnings::get).patch(earnings::update))
        .route("/earnings/referrer/{id}", get(earnings::by_referrer))
        .route("/activities", get(activities::recent).post(activities::create))
        .route("/analytics/overview", get(analytics::overview))
        .route("/analytics/referrer/{id}", get(analytics::referrer));

    Router::new()
        .route("/health", get(health_check))
        .nest(API_BASE, api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ServerError {
    ServerError::NotFound("Route")
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
