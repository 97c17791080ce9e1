use sqlx::PgPool;
use tracing::info;

use crate::error::ApiError;
use crate::services::metrics::SWEPT_VOTES_COUNTER;

/// Roster reads and the vote sweep they drive. Roster CRUD (spreadsheet
/// import and the like) lives in the admin tooling.
pub struct RosterService;

impl RosterService {
    /// Students currently allowed to vote; the denominator for turnout.
    pub async fn total_eligible(pool: &PgPool) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE enrolled")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Drop vote records whose student has left the roster or is no longer
    /// enrolled. Returns the number of rows removed across both tables.
    pub async fn sweep_unrostered_votes(pool: &PgPool) -> Result<u64, ApiError> {
        let votes = sqlx::query(
            "DELETE FROM votes v
             WHERE NOT EXISTS (
                 SELECT 1 FROM students s WHERE s.id = v.student_id AND s.enrolled
             )",
        )
        .execute(pool)
        .await?
        .rows_affected();

        let submissions = sqlx::query(
            "DELETE FROM vote_submissions v
             WHERE NOT EXISTS (
                 SELECT 1 FROM students s WHERE s.id = v.student_id AND s.enrolled
             )",
        )
        .execute(pool)
        .await?
        .rows_affected();

        let removed = votes + submissions;
        if removed > 0 {
            SWEPT_VOTES_COUNTER.inc_by(removed as f64);
            info!("roster sweep removed {removed} vote rows");
        }
        Ok(removed)
    }
}
