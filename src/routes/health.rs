use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = sqlx::query("SELECT 1").execute(&state.db).await;
    let mut conn = state.redis.clone();
    let cache: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;

    match (&db, &cache) {
        (Ok(_), Ok(_)) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected", "cache": "connected" })),
        ),
        _ => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "error",
                "db": db.err().map_or_else(|| "connected".to_string(), |e| e.to_string()),
                "cache": cache.err().map_or_else(|| "connected".to_string(), |e| e.to_string()),
            })),
        ),
    }
}
