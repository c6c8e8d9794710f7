//! REST API Server for the finance query gateway
//!
//! Exposes the dispatcher and the portfolio advisor via HTTP endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Instrument};

use crate::config::GEMINI_MODEL;
use crate::dispatcher::Dispatcher;
use crate::error::GatewayError;
use crate::models::{GenerateRequest, GenerateResponse, InvestorProfile};
use crate::portfolio::PortfolioAdvisor;

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    pub advisor: Arc<PortfolioAdvisor>,
}

/// Malformed JSON bodies get the same error shape as every other failure
fn reject(rejection: JsonRejection) -> GatewayError {
    GatewayError::InvalidRequest(rejection.body_text())
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "model": GEMINI_MODEL,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Generate Endpoint
/// =============================

async fn generate(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, GatewayError> {
    let Json(req) = payload.map_err(reject)?;

    let span = info_span!("generate", request_id = %uuid::Uuid::new_v4());
    async move {
        info!(query_chars = req.query().len(), "Received generate request");
        let response = state.dispatcher.generate(&req).await?;
        Ok::<_, GatewayError>(Json(response))
    }
    .instrument(span)
    .await
}

/// =============================
/// Portfolio Endpoint
/// =============================

async fn portfolio(
    State(state): State<ApiState>,
    payload: Result<Json<InvestorProfile>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(profile) = payload.map_err(reject)?;

    let span = info_span!("portfolio", request_id = %uuid::Uuid::new_v4());
    async move {
        info!(risk = %profile.risk(), "Received portfolio request");
        let plan = state.advisor.advise(&profile).await?;
        Ok::<_, GatewayError>(Json(plan))
    }
    .instrument(span)
    .await
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/api/portfolio", post(portfolio))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: ApiState, addr: &str) -> crate::Result<()> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API Server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
