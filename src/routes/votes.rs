use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{
        session::{Session, StudentSession},
        vote::{MyVotes, SubmitVoteRequest},
    },
    services::votes::VoteLedger,
    AppState,
};

/// POST /votes — students; submit (or edit) one day's selection
pub async fn submit_vote(
    State(state): State<AppState>,
    session: StudentSession,
    Json(body): Json<SubmitVoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let today = Local::now().date_naive();
    let selection =
        VoteLedger::submit(&state.db, &state.menu, &state.feed, &session, today, &body).await?;
    Ok(Json(serde_json::to_value(MyVotes {
        day: body.day,
        selection,
    })?))
}

/// GET /votes/{date}/mine — students; their own stored selection
pub async fn my_votes(
    State(state): State<AppState>,
    session: StudentSession,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, ApiError> {
    let votes = VoteLedger::my_votes(&state.db, &session, date).await?;
    Ok(Json(serde_json::to_value(votes)?))
}

/// GET /votes/{date}/counts — any session; distinct-student tallies
pub async fn day_counts(
    State(state): State<AppState>,
    _session: Session,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, ApiError> {
    let counts = VoteLedger::counts(&state.db, date).await?;
    Ok(Json(serde_json::to_value(counts)?))
}
