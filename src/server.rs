//! HTTP server for the "find best match" operation.
//!
//! Provides [`router`] (used directly by tests) and [`serve`], which wires the
//! configured embedding provider into a running axum server.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::MedmatchConfig;
use crate::embedding::{self, EmbeddingAdapter};
use crate::error::MatchError;
use crate::matching::{MatchRequest, MatchResponse, MatchService};

#[derive(Clone)]
pub struct AppState {
    service: Arc<MatchService>,
}

impl AppState {
    pub fn new(service: MatchService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
}

impl MatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProviderFailure(_) => StatusCode::BAD_GATEWAY,
            Self::DegenerateVector { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ShapeMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.kind(),
            status: status.as_u16(),
        });
        (status, body).into_response()
    }
}

/// Build the router. CORS is permissive when `cors` is set.
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/healthz", get(health_handler))
        .route("/ai-search", post(match_handler))
        .route("/v1/match", post(match_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.service.adapter().provider();
    Json(HealthResponse {
        status: "ok",
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
    })
}

async fn match_handler(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, MatchError> {
    let Json(request) = payload.map_err(|e| MatchError::invalid(e.body_text()))?;
    let response = state.service.find_best(request).await.map_err(|e| {
        if !e.is_client_error() {
            tracing::warn!(error = %e, code = e.kind(), "match request failed");
        }
        e
    })?;
    Ok(Json(response))
}

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(config: MedmatchConfig) -> Result<()> {
    let provider = embedding::create_provider(&config.embedding)?;
    let adapter = EmbeddingAdapter::new(provider, config.embedding.timeout());
    let service = MatchService::new(adapter, config.matching.clone());
    let app = router(AppState::new(service), config.server.cors);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "medmatch listening at http://{bind_addr}/ai-search");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
