use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::menu::MealCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Submitted,
    Reviewed,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::Reviewed => "reviewed",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    /// Resolved is terminal; the only legal moves are
    /// submitted -> reviewed, submitted -> resolved, reviewed -> resolved.
    pub fn can_transition_to(self, next: ComplaintStatus) -> bool {
        matches!(
            (self, next),
            (ComplaintStatus::Submitted, ComplaintStatus::Reviewed)
                | (ComplaintStatus::Submitted, ComplaintStatus::Resolved)
                | (ComplaintStatus::Reviewed, ComplaintStatus::Resolved)
        )
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ComplaintStatus::Submitted),
            "reviewed" => Ok(ComplaintStatus::Reviewed),
            "resolved" => Ok(ComplaintStatus::Resolved),
            _ => Err(anyhow::anyhow!("Unknown complaint status: {s}")),
        }
    }
}

/// Dedup key form of a food item name: trimmed and lower-cased.
/// Applying it twice changes nothing.
pub fn normalize_food_item(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// DB row struct — category and status are fetched as TEXT
/// (category::TEXT, status::TEXT).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: String,
    pub day: NaiveDate,
    pub category: String,
    /// Stored in normalized form (see normalize_food_item).
    pub food_item: String,
    pub complaint: String,
    pub status: String,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for POST /complaints.
#[derive(Debug, Deserialize)]
pub struct SubmitComplaintRequest {
    pub day: NaiveDate,
    pub category: MealCategory,
    pub food_item: String,
    pub complaint: String,
}

/// Body for PUT /complaints/{id}/status.
#[derive(Debug, Deserialize)]
pub struct UpdateComplaintStatusRequest {
    pub status: ComplaintStatus,
}

/// Body for POST /complaints/{id}/reply.
#[derive(Debug, Deserialize)]
pub struct ReplyComplaintRequest {
    pub reply: String,
}

/// Query params for GET /complaints.
#[derive(Debug, Deserialize)]
pub struct ComplaintListQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<ComplaintStatus>,
}

/// Query params for GET /complaints/mine.
#[derive(Debug, Deserialize)]
pub struct MyComplaintsQuery {
    pub date: Option<NaiveDate>,
}

/// Query params for GET /complaints/summary.
#[derive(Debug, Deserialize)]
pub struct ComplaintSummaryQuery {
    pub date: Option<NaiveDate>,
    pub top: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusCounts {
    pub submitted: i64,
    pub reviewed: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemComplaintCount {
    pub food_item: String,
    pub complaints: i64,
}

/// Response for GET /complaints/summary.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintSummary {
    pub day: NaiveDate,
    pub by_status: StatusCounts,
    pub top_items: Vec<ItemComplaintCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_is_terminal() {
        assert!(!ComplaintStatus::Resolved.can_transition_to(ComplaintStatus::Submitted));
        assert!(!ComplaintStatus::Resolved.can_transition_to(ComplaintStatus::Reviewed));
        assert!(!ComplaintStatus::Resolved.can_transition_to(ComplaintStatus::Resolved));
    }

    #[test]
    fn forward_transitions_are_legal() {
        assert!(ComplaintStatus::Submitted.can_transition_to(ComplaintStatus::Reviewed));
        assert!(ComplaintStatus::Submitted.can_transition_to(ComplaintStatus::Resolved));
        assert!(ComplaintStatus::Reviewed.can_transition_to(ComplaintStatus::Resolved));
        assert!(!ComplaintStatus::Reviewed.can_transition_to(ComplaintStatus::Submitted));
    }

    #[test]
    fn food_item_normalization_is_idempotent() {
        let once = normalize_food_item("  Paneer Butter Masala ");
        assert_eq!(once, "paneer butter masala");
        assert_eq!(normalize_food_item(&once), once);
    }
}
