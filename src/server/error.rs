use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::generation::{GenerationError, ModelError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database not initialized")]
    DatabaseNotInitialized,
    #[error("Recipe not found")]
    NotFound,
    #[error("Invalid recipe data")]
    InvalidRecipe(String),
    #[error("Model call failed")]
    Model(#[from] ModelError),
    #[error("Failed to access recipes")]
    Store(#[from] StoreError),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Model(e) => AppError::Model(e),
            GenerationError::Store(e) => AppError::Store(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DatabaseNotInitialized | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidRecipe(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Model(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Model(e) => {
                error!(error = %e, "model call failed");
                json!({ "error": self.to_string(), "detail": e.to_string() })
            }
            AppError::Store(e) => {
                error!(error = %e, "store access failed");
                json!({ "error": self.to_string(), "detail": e.to_string() })
            }
            AppError::InvalidRecipe(detail) => json!({ "error": self.to_string(), "detail": detail }),
            AppError::DatabaseNotInitialized | AppError::NotFound => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
