use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::complaint::{
    normalize_food_item, Complaint, ComplaintStatus, ComplaintSummary, ItemComplaintCount,
    StatusCounts, SubmitComplaintRequest,
};
use crate::models::session::{ManagementSession, StudentSession};
use crate::services::changefeed::ChangeFeed;
use crate::services::menu_window::MenuWindowManager;
use crate::services::metrics::{
    COMPLAINTS_COUNTER, COMPLAINT_DUPLICATES_COUNTER, STALE_COMPLAINTS_COUNTER,
};

const COMPLAINT_COLUMNS: &str = "id, user_id, day, category::TEXT AS category, food_item, \
     complaint, status::TEXT AS status, reply, created_at, updated_at";

/// The daily complaint ledger. One complaint per (user, day, food item);
/// complaints older than today are purged whenever a view loads.
pub struct ComplaintLedger;

impl ComplaintLedger {
    /// File a complaint. The item must be on that day's menu for the named
    /// category. The food item is stored in normalized form and the unique
    /// index on (user_id, day, food_item) is the dedup authority, so two
    /// clients racing on the same item produce exactly one row.
    pub async fn submit(
        pool: &PgPool,
        menu: &MenuWindowManager,
        feed: &ChangeFeed,
        session: &StudentSession,
        req: &SubmitComplaintRequest,
    ) -> Result<Complaint, ApiError> {
        let text = req.complaint.trim();
        if text.is_empty() {
            return Err(ApiError::Validation(format!(
                "complaint text for \"{}\" is empty",
                req.food_item.trim()
            )));
        }
        let food_item = normalize_food_item(&req.food_item);
        if food_item.is_empty() {
            return Err(ApiError::Validation("food item name is empty".into()));
        }

        let day_menu = menu.day(req.day).await?;
        if !day_menu
            .category(req.category)
            .iter()
            .any(|name| name.to_lowercase() == food_item)
        {
            return Err(ApiError::Validation(format!(
                "\"{}\" is not on the {} menu for {}",
                req.food_item.trim(),
                req.category,
                req.day
            )));
        }

        let inserted = sqlx::query_as::<_, Complaint>(&format!(
            "INSERT INTO complaints (user_id, day, category, food_item, complaint)
             VALUES ($1, $2, $3::meal_category, $4, $5)
             ON CONFLICT (user_id, day, food_item) DO NOTHING
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(&session.student_id)
        .bind(req.day)
        .bind(req.category.to_string())
        .bind(&food_item)
        .bind(text)
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(complaint) => {
                COMPLAINTS_COUNTER.inc();
                feed.complaints_changed(req.day);
                Ok(complaint)
            }
            None => {
                COMPLAINT_DUPLICATES_COUNTER.inc();
                Err(ApiError::DuplicateComplaint {
                    day: req.day,
                    food_item,
                })
            }
        }
    }

    /// The calling student's complaints for one day, newest first.
    pub async fn mine(
        pool: &PgPool,
        session: &StudentSession,
        today: NaiveDate,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Complaint>, ApiError> {
        Self::sweep_stale(pool, today).await?;
        let day = date.unwrap_or(today);
        let complaints = sqlx::query_as::<_, Complaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints
             WHERE user_id = $1 AND day = $2
             ORDER BY created_at DESC"
        ))
        .bind(&session.student_id)
        .bind(day)
        .fetch_all(pool)
        .await?;
        Ok(complaints)
    }

    /// Every complaint for one day, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        _session: &ManagementSession,
        today: NaiveDate,
        date: Option<NaiveDate>,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<Complaint>, ApiError> {
        Self::sweep_stale(pool, today).await?;
        let day = date.unwrap_or(today);
        let complaints = match status {
            Some(status) => {
                sqlx::query_as::<_, Complaint>(&format!(
                    "SELECT {COMPLAINT_COLUMNS} FROM complaints
                     WHERE day = $1 AND status = $2::complaint_status
                     ORDER BY created_at DESC"
                ))
                .bind(day)
                .bind(status.to_string())
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Complaint>(&format!(
                    "SELECT {COMPLAINT_COLUMNS} FROM complaints
                     WHERE day = $1
                     ORDER BY created_at DESC"
                ))
                .bind(day)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(complaints)
    }

    /// Move a complaint along the status machine. Once a reply exists the
    /// status is locked; the guarded UPDATE keeps a concurrent moderator
    /// from sneaking a transition past the check.
    pub async fn update_status(
        pool: &PgPool,
        feed: &ChangeFeed,
        _session: &ManagementSession,
        id: Uuid,
        new_status: ComplaintStatus,
    ) -> Result<Complaint, ApiError> {
        let current = Self::fetch(pool, id).await?;
        if current.reply.is_some() {
            return Err(ApiError::Validation(format!(
                "complaint {id} already has a reply; its status is locked"
            )));
        }
        let current_status: ComplaintStatus = current
            .status
            .parse()
            .map_err(|e: anyhow::Error| ApiError::Internal(e.to_string()))?;
        if !current_status.can_transition_to(new_status) {
            return Err(ApiError::Validation(format!(
                "cannot move complaint {id} from {current_status} to {new_status}"
            )));
        }

        let updated = sqlx::query_as::<_, Complaint>(&format!(
            "UPDATE complaints
             SET status = $2::complaint_status
             WHERE id = $1 AND status = $3::complaint_status AND reply IS NULL
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(id)
        .bind(new_status.to_string())
        .bind(current_status.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("complaint {id} changed concurrently; reload and retry"))
        })?;

        feed.complaints_changed(updated.day);
        Ok(updated)
    }

    /// Attach the management reply. Replying resolves the complaint in the
    /// same statement, and a complaint can be replied to exactly once.
    pub async fn reply(
        pool: &PgPool,
        feed: &ChangeFeed,
        _session: &ManagementSession,
        id: Uuid,
        reply: &str,
    ) -> Result<Complaint, ApiError> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ApiError::Validation("reply text is empty".into()));
        }

        let current = Self::fetch(pool, id).await?;
        if current.reply.is_some() {
            return Err(ApiError::Validation(format!(
                "complaint {id} already has a reply"
            )));
        }

        let updated = sqlx::query_as::<_, Complaint>(&format!(
            "UPDATE complaints
             SET reply = $2, status = 'resolved'
             WHERE id = $1 AND reply IS NULL
             RETURNING {COMPLAINT_COLUMNS}"
        ))
        .bind(id)
        .bind(reply)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("complaint {id} was replied to concurrently"))
        })?;

        feed.complaints_changed(updated.day);
        Ok(updated)
    }

    /// Status tallies and the most-complained-about items for one day.
    pub async fn summary(
        pool: &PgPool,
        _session: &ManagementSession,
        today: NaiveDate,
        date: Option<NaiveDate>,
        top: Option<i64>,
    ) -> Result<ComplaintSummary, ApiError> {
        Self::sweep_stale(pool, today).await?;
        let day = date.unwrap_or(today);
        let top = top.unwrap_or(5).clamp(1, 50);

        let mut by_status = StatusCounts::default();
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status::TEXT, COUNT(*) FROM complaints WHERE day = $1 GROUP BY status",
        )
        .bind(day)
        .fetch_all(pool)
        .await?;
        for (status, count) in rows {
            match status
                .parse::<ComplaintStatus>()
                .map_err(|e: anyhow::Error| ApiError::Internal(e.to_string()))?
            {
                ComplaintStatus::Submitted => by_status.submitted = count,
                ComplaintStatus::Reviewed => by_status.reviewed = count,
                ComplaintStatus::Resolved => by_status.resolved = count,
            }
        }

        let top_items = sqlx::query_as::<_, (String, i64)>(
            "SELECT food_item, COUNT(*)
             FROM complaints
             WHERE day = $1
             GROUP BY food_item
             ORDER BY COUNT(*) DESC, food_item
             LIMIT $2",
        )
        .bind(day)
        .bind(top)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(food_item, complaints)| ItemComplaintCount {
            food_item,
            complaints,
        })
        .collect();

        Ok(ComplaintSummary {
            day,
            by_status,
            top_items,
        })
    }

    /// Complaints are a one-day ledger: purge everything not from `today`.
    /// Runs on every view load, student and management alike.
    pub async fn sweep_stale(pool: &PgPool, today: NaiveDate) -> Result<u64, ApiError> {
        let purged = sqlx::query("DELETE FROM complaints WHERE day <> $1")
            .bind(today)
            .execute(pool)
            .await?
            .rows_affected();
        if purged > 0 {
            STALE_COMPLAINTS_COUNTER.inc_by(purged as f64);
            info!("purged {purged} stale complaints");
        }
        Ok(purged)
    }

    async fn fetch(pool: &PgPool, id: Uuid) -> Result<Complaint, ApiError> {
        sqlx::query_as::<_, Complaint>(&format!(
            "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("complaint {id}")))
    }
}
