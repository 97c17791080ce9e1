use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Gauge, GaugeVec,
};
use sqlx::PgPool;
use tracing::warn;

lazy_static! {
    // ── Event counters (increment on each event) ────────────────────────────
    pub static ref VOTE_SUBMISSIONS_COUNTER: CounterVec = register_counter_vec!(
        "mess_vote_submissions_total",
        "Vote submissions accepted, by kind (new or edit)",
        &["kind"]
    ).unwrap();

    pub static ref VOTE_DUPLICATES_COUNTER: Counter = register_counter!(
        "mess_vote_duplicates_total",
        "Vote submissions rejected as duplicates"
    ).unwrap();

    pub static ref COMPLAINTS_COUNTER: Counter = register_counter!(
        "mess_complaints_total",
        "Complaints filed"
    ).unwrap();

    pub static ref COMPLAINT_DUPLICATES_COUNTER: Counter = register_counter!(
        "mess_complaint_duplicates_total",
        "Complaints rejected as duplicates"
    ).unwrap();

    pub static ref ROLLOVERS_COUNTER: Counter = register_counter!(
        "mess_menu_rollovers_total",
        "Menu window rollovers performed"
    ).unwrap();

    pub static ref SWEPT_VOTES_COUNTER: Counter = register_counter!(
        "mess_swept_votes_total",
        "Vote rows removed by the roster sweep"
    ).unwrap();

    pub static ref STALE_COMPLAINTS_COUNTER: Counter = register_counter!(
        "mess_stale_complaints_purged_total",
        "Complaints purged by the daily retention rule"
    ).unwrap();

    // ── Business metrics ────────────────────────────────────────────────────
    pub static ref ENROLLED_STUDENTS_GAUGE: Gauge = register_gauge!(
        "mess_enrolled_students",
        "Students currently enrolled"
    ).unwrap();

    pub static ref VOTED_TODAY_GAUGE: Gauge = register_gauge!(
        "mess_voted_today",
        "Students who have submitted a vote for today"
    ).unwrap();

    pub static ref COMPLAINTS_GAUGE: GaugeVec = register_gauge_vec!(
        "mess_complaints_by_status",
        "Today's complaints by status",
        &["status"]
    ).unwrap();
}

/// Spawn the background metrics collector (refreshes every 5 minutes).
pub fn start(pool: PgPool) {
    tokio::spawn(async move {
        // Initial collection on startup
        if let Err(e) = collect(&pool).await {
            warn!("Metrics: initial collection failed: {}", e);
        }
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            if let Err(e) = collect(&pool).await {
                warn!("Metrics: collection failed: {}", e);
            }
        }
    });
}

async fn collect(pool: &PgPool) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();

    let enrolled: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE enrolled")
        .fetch_one(pool)
        .await?;
    ENROLLED_STUDENTS_GAUGE.set(enrolled as f64);

    let voted: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT student_id) FROM vote_submissions WHERE day = $1")
            .bind(today)
            .fetch_one(pool)
            .await?;
    VOTED_TODAY_GAUGE.set(voted as f64);

    for status in ["submitted", "reviewed", "resolved"] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM complaints WHERE day = $1 AND status = $2::complaint_status",
        )
        .bind(today)
        .bind(status)
        .fetch_one(pool)
        .await?;
        COMPLAINTS_GAUGE.with_label_values(&[status]).set(count as f64);
    }

    Ok(())
}
