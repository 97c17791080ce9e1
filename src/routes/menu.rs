use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{
        menu::SetDayMenuRequest,
        session::{ManagementSession, Session},
    },
    AppState,
};

/// GET /menu — any session; the seven visible days starting today
pub async fn get_window(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let days = state.menu.window(today).await?;
    Ok(Json(serde_json::to_value(days)?))
}

/// GET /menu/{date} — any session; one day, empty if unplanned
pub async fn get_day(
    State(state): State<AppState>,
    _session: Session,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, ApiError> {
    let day = state.menu.day(date).await?;
    Ok(Json(serde_json::to_value(day)?))
}

/// PUT /menu/{date} — management only; replaces the whole day
pub async fn set_day(
    State(state): State<AppState>,
    _session: ManagementSession,
    Path(date): Path<NaiveDate>,
    Json(body): Json<SetDayMenuRequest>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let day = state.menu.set_day(&state.db, date, today, &body).await?;
    Ok(Json(serde_json::to_value(day)?))
}
