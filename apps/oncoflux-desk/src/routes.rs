//! Rotas HTTP do OncoFlux Desk
//!
//! Formulário, registros e dashboard servidos em JSON.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use oncoflux_db::{Backend, FormOptions, OncoFlux, Record, SubmissionForm, Summary};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::ApiError;

const EMPTY_DASHBOARD: &str = "Comece a registrar dados para gerar o Dashboard.";

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<OncoFlux<Backend>>,
}

/// Estado do dashboard: sem dados ainda é diferente de indisponível
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardResponse {
    Success { data: Summary },
    Empty { message: String },
    Error { message: String },
}

pub fn router(desk: Arc<OncoFlux<Backend>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/opcoes", get(form_options))
        .route("/registros", get(list_records).post(create_record))
        .route("/dashboard", get(dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { desk })
}

async fn health() -> &'static str {
    "ok"
}

async fn form_options() -> Json<FormOptions> {
    Json(FormOptions::default())
}

async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<SubmissionForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(form) = payload?;
    let record = state.desk.submit(&form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.desk.records().await?))
}

async fn dashboard(State(state): State<AppState>) -> (StatusCode, Json<DashboardResponse>) {
    match state.desk.summary().await {
        Ok(summary) if summary.is_empty() => (
            StatusCode::OK,
            Json(DashboardResponse::Empty {
                message: EMPTY_DASHBOARD.to_string(),
            }),
        ),
        Ok(summary) => (StatusCode::OK, Json(DashboardResponse::Success { data: summary })),
        Err(e) => {
            error!("Dashboard indisponível: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DashboardResponse::Error {
                    message: e.to_string(),
                }),
            )
        }
    }
}
