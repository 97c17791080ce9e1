use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Local;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        complaint::{
            ComplaintListQuery, ComplaintSummaryQuery, MyComplaintsQuery, ReplyComplaintRequest,
            SubmitComplaintRequest, UpdateComplaintStatusRequest,
        },
        session::{ManagementSession, StudentSession},
    },
    services::complaints::ComplaintLedger,
    AppState,
};

/// POST /complaints — students; file a complaint about one food item
pub async fn submit_complaint(
    State(state): State<AppState>,
    session: StudentSession,
    Json(body): Json<SubmitComplaintRequest>,
) -> Result<Json<Value>, ApiError> {
    let complaint =
        ComplaintLedger::submit(&state.db, &state.menu, &state.feed, &session, &body).await?;
    Ok(Json(serde_json::to_value(complaint)?))
}

/// GET /complaints/mine?date= — students; their own complaints
pub async fn my_complaints(
    State(state): State<AppState>,
    session: StudentSession,
    Query(params): Query<MyComplaintsQuery>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let complaints = ComplaintLedger::mine(&state.db, &session, today, params.date).await?;
    Ok(Json(serde_json::to_value(complaints)?))
}

/// GET /complaints?date=&status= — management; the day's full ledger
pub async fn list_complaints(
    State(state): State<AppState>,
    session: ManagementSession,
    Query(params): Query<ComplaintListQuery>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let complaints =
        ComplaintLedger::list(&state.db, &session, today, params.date, params.status).await?;
    Ok(Json(serde_json::to_value(complaints)?))
}

/// PUT /complaints/{id}/status — management; walk the status machine
pub async fn update_status(
    State(state): State<AppState>,
    session: ManagementSession,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateComplaintStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let complaint =
        ComplaintLedger::update_status(&state.db, &state.feed, &session, id, body.status).await?;
    Ok(Json(serde_json::to_value(complaint)?))
}

/// POST /complaints/{id}/reply — management; reply and resolve in one step
pub async fn reply(
    State(state): State<AppState>,
    session: ManagementSession,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplyComplaintRequest>,
) -> Result<Json<Value>, ApiError> {
    let complaint =
        ComplaintLedger::reply(&state.db, &state.feed, &session, id, &body.reply).await?;
    Ok(Json(serde_json::to_value(complaint)?))
}

/// GET /complaints/summary?date=&top= — management; status and item tallies
pub async fn complaint_summary(
    State(state): State<AppState>,
    session: ManagementSession,
    Query(params): Query<ComplaintSummaryQuery>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let summary =
        ComplaintLedger::summary(&state.db, &session, today, params.date, params.top).await?;
    Ok(Json(serde_json::to_value(summary)?))
}
