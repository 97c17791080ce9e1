use axum::{extract::State, Json};
use serde_json::Value;

use crate::{
    error::ApiError, models::session::Session, services::catalog::CatalogService, AppState,
};

/// GET /catalog — any session; food items with their allowed categories
pub async fn list_catalog(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Value>, ApiError> {
    let items = CatalogService::list(&state.db).await?;
    Ok(Json(serde_json::to_value(items)?))
}
