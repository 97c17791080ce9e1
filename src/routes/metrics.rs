use axum::http::StatusCode;
use prometheus::{Encoder, TextEncoder};

/// GET /metrics — Prometheus scrape endpoint, fronted by the internal proxy.
pub async fn metrics_handler() -> Result<String, StatusCode> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
