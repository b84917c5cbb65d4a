use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::error::AppError;
use super::AppState;
use crate::generation::GenerationOutcome;
use crate::scaling::{DetailView, DisplayMode, ScaledRecipe, ServingScaler};
use crate::catalog::SearchOutcome;
use crate::search::SearchRequest;

/// Upper bound on recipes produced by one generate call.
pub const MAX_GENERATE: usize = 10;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(search_recipes))
        .route("/recipes/search", post(search_recipes))
        .route("/recipes/:id", get(get_recipe))
        .route("/recipes/:id/scaled", get(get_scaled_recipe))
        .route("/generate-recipes", post(generate_recipes))
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn search_recipes(State(state): State<AppState>, body: Bytes) -> Result<Json<SearchOutcome>, AppError> {
    let request = SearchRequest::from_body(&body);
    info!(terms = ?request.terms, filters = ?request.filters, generate_if_empty = request.generate_if_empty, "search request");
    let catalog = state.catalog()?;
    Ok(Json(catalog.search(&request).await?))
}

/// Reads `n` from a generate body. Missing, non-numeric or sub-one values
/// become 1.
pub fn requested_count(body: &[u8]) -> usize {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    let n = match value.get("n") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n >= 1.0 => (n.floor() as usize).min(MAX_GENERATE),
        _ => 1,
    }
}

async fn generate_recipes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerationOutcome>, AppError> {
    let n = requested_count(&body);
    let catalog = state.catalog()?;
    info!(n, "generate request");
    Ok(Json(catalog.generate(n).await?))
}

/// `recipe` is the stored document as-is, so a malformed one reaches the
/// client and renders as invalid data there.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub recipe: Value,
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, AppError> {
    info!(%id, "fetching recipe");
    let catalog = state.catalog()?;
    let recipe = catalog.document(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(RecipeResponse { recipe }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScaleQuery {
    pub servings: Option<String>,
    pub mode: Option<String>,
}

async fn get_scaled_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ScaleQuery>,
) -> Result<Json<ScaledRecipe>, AppError> {
    let catalog = state.catalog()?;
    let recipe = match catalog.detail(&id).await? {
        DetailView::Loaded(recipe) => recipe,
        DetailView::NotFound => return Err(AppError::NotFound),
        DetailView::InvalidData(detail) => return Err(AppError::InvalidRecipe(detail)),
    };

    let mut scaler = ServingScaler::for_recipe(&recipe);
    if let Some(servings) = query.servings.as_deref() {
        scaler.set_from_input(servings);
    }
    if query.mode.as_deref() == Some("total") {
        scaler.set_mode(DisplayMode::Total);
    }
    Ok(Json(scaler.scale(&recipe)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_count_defaults_to_one() {
        assert_eq!(requested_count(b""), 1);
        assert_eq!(requested_count(br#"{"n": "abc"}"#), 1);
        assert_eq!(requested_count(br#"{"n": 0}"#), 1);
        assert_eq!(requested_count(br#"{"n": 3}"#), 3);
        assert_eq!(requested_count(br#"{"n": "2"}"#), 2);
        assert_eq!(requested_count(br#"{"n": 2.9}"#), 2);
        assert_eq!(requested_count(br#"{"n": 500}"#), MAX_GENERATE);
    }
}
