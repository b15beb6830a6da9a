//! Erros das rotas e envelope JSON `{code, message}`

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use oncoflux_db::{SchemaError, StoreError};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
}

/// Erro de uma rota, convertido em resposta JSON
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    /// Corpo da requisição ausente ou que não é JSON válido
    Body(JsonRejection),
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Store(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Body(value)
    }
}

pub fn map_rejection(rejection: &JsonRejection) -> (StatusCode, Json<ErrorEnvelope>) {
    (
        rejection.status(),
        Json(ErrorEnvelope {
            code: "invalid_input",
            message: rejection.body_text(),
        }),
    )
}

pub fn map_error(err: &StoreError) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code) = match err {
        StoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input"),
        StoreError::Schema(SchemaError::HeaderMismatch { .. }) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "schema_mismatch")
        }
        StoreError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "malformed_data"),
        StoreError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        StoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message: err.to_string(),
        }),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(err) => {
                if !err.is_validation() {
                    error!("Falha no repositório de registros: {}", err);
                }
                map_error(&err).into_response()
            }
            ApiError::Body(rejection) => map_rejection(&rejection).into_response(),
        }
    }
}
