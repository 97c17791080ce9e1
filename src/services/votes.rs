use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::models::menu::{DayMenu, MealCategory, OTHERS_SENTINELS};
use crate::models::session::StudentSession;
use crate::models::vote::{
    DayCounts, ItemCount, MealSelection, MyVotes, SubmitVoteRequest, VoteCategory,
};
use crate::services::changefeed::ChangeFeed;
use crate::services::menu_window::{ensure_in_window, MenuWindowManager};
use crate::services::metrics::{VOTE_DUPLICATES_COUNTER, VOTE_SUBMISSIONS_COUNTER};
use crate::services::roster::RosterService;

/// The daily vote ledger. One submission per (day, category, student);
/// edits replace the whole submission instead of merging.
pub struct VoteLedger;

impl VoteLedger {
    /// Record a student's selection for one day.
    ///
    /// The day must fall inside the current menu window, same bound as menu
    /// writes. The selection is normalized (sentinel dominance, trim,
    /// dedupe) and checked against that day's menu before anything is
    /// written. New submissions conflict with any existing category; edits
    /// wipe the previous submission and reinsert. The per-category primary
    /// key on vote_submissions closes the gap between check and insert, so
    /// a racing duplicate loses even if both pass the pre-check.
    pub async fn submit(
        pool: &PgPool,
        menu: &MenuWindowManager,
        feed: &ChangeFeed,
        session: &StudentSession,
        today: NaiveDate,
        req: &SubmitVoteRequest,
    ) -> Result<MealSelection, ApiError> {
        let day = req.day;
        ensure_in_window(day, today)?;
        let selection = req.selection.normalize();
        if selection.is_empty() {
            return Err(ApiError::Validation(format!(
                "nothing selected for {day}"
            )));
        }

        let day_menu = menu.day(day).await?;
        let selection = validate_selection(day, &day_menu, selection)?;
        let categories = selection.categories_present();

        let mut tx = pool.begin().await?;

        let existing: Vec<String> = sqlx::query_scalar(
            "SELECT category::TEXT FROM vote_submissions WHERE day = $1 AND student_id = $2",
        )
        .bind(day)
        .bind(&session.student_id)
        .fetch_all(&mut *tx)
        .await?;

        if req.edit {
            if existing.is_empty() {
                return Err(ApiError::NotFound(format!("existing vote for {day}")));
            }
            sqlx::query("DELETE FROM votes WHERE day = $1 AND student_id = $2")
                .bind(day)
                .bind(&session.student_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM vote_submissions WHERE day = $1 AND student_id = $2")
                .bind(day)
                .bind(&session.student_id)
                .execute(&mut *tx)
                .await?;
        } else {
            for category in &categories {
                if existing.iter().any(|c| c == category.as_str()) {
                    VOTE_DUPLICATES_COUNTER.inc();
                    return Err(ApiError::DuplicateVote {
                        day,
                        category: *category,
                    });
                }
            }
        }

        for category in &categories {
            let inserted = sqlx::query(
                "INSERT INTO vote_submissions (day, category, student_id)
                 VALUES ($1, $2::vote_category, $3)
                 ON CONFLICT (day, category, student_id) DO NOTHING",
            )
            .bind(day)
            .bind(category.to_string())
            .bind(&session.student_id)
            .execute(&mut *tx)
            .await?;
            // Zero rows means another client won the race since the pre-check.
            if inserted.rows_affected() == 0 {
                VOTE_DUPLICATES_COUNTER.inc();
                return Err(ApiError::DuplicateVote {
                    day,
                    category: *category,
                });
            }
        }

        for category in MealCategory::ALL {
            for item in selection.category(category) {
                insert_vote(&mut tx, day, VoteCategory::from(category), &session.student_id, item)
                    .await?;
            }
        }
        for sentinel in &selection.others {
            insert_vote(&mut tx, day, VoteCategory::Others, &session.student_id, sentinel)
                .await?;
        }

        tx.commit().await?;

        VOTE_SUBMISSIONS_COUNTER
            .with_label_values(&[if req.edit { "edit" } else { "new" }])
            .inc();
        feed.votes_changed(day);
        Ok(selection)
    }

    /// Per-item tallies for one day. Items compare case-insensitively after
    /// trimming, and each student counts once per item.
    pub async fn counts(pool: &PgPool, day: NaiveDate) -> Result<DayCounts, ApiError> {
        let mut counts = DayCounts::empty(day);
        counts.total_eligible = RosterService::total_eligible(pool).await?;
        counts.voted = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT student_id) FROM vote_submissions WHERE day = $1",
        )
        .bind(day)
        .fetch_one(pool)
        .await?;

        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT category::TEXT, MIN(TRIM(item_name)), COUNT(DISTINCT student_id)
             FROM votes
             WHERE day = $1
             GROUP BY category, LOWER(TRIM(item_name))
             ORDER BY category, 3 DESC, 2",
        )
        .bind(day)
        .fetch_all(pool)
        .await?;

        for (category, item, votes) in rows {
            let category: VoteCategory = category
                .parse()
                .map_err(|e: anyhow::Error| ApiError::Internal(e.to_string()))?;
            counts.category_mut(category).push(ItemCount { item, votes });
        }
        Ok(counts)
    }

    /// The calling student's own selection for one day, empty if they
    /// haven't voted.
    pub async fn my_votes(
        pool: &PgPool,
        session: &StudentSession,
        day: NaiveDate,
    ) -> Result<MyVotes, ApiError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT category::TEXT, item_name
             FROM votes
             WHERE day = $1 AND student_id = $2
             ORDER BY category, item_name",
        )
        .bind(day)
        .bind(&session.student_id)
        .fetch_all(pool)
        .await?;

        let mut selection = MealSelection::default();
        for (category, item) in rows {
            let category: VoteCategory = category
                .parse()
                .map_err(|e: anyhow::Error| ApiError::Internal(e.to_string()))?;
            selection.push(category, item);
        }
        Ok(MyVotes { day, selection })
    }
}

async fn insert_vote(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    day: NaiveDate,
    category: VoteCategory,
    student_id: &str,
    item: &str,
) -> Result<(), ApiError> {
    sqlx::query(
        "INSERT INTO votes (day, category, student_id, item_name)
         VALUES ($1, $2::vote_category, $3, $4)",
    )
    .bind(day)
    .bind(category.to_string())
    .bind(student_id)
    .bind(item)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Resolve each selected item against the day's menu (case-insensitive,
/// storing the menu's spelling) and check sentinels against the fixed list.
fn validate_selection(
    day: NaiveDate,
    menu: &DayMenu,
    mut selection: MealSelection,
) -> Result<MealSelection, ApiError> {
    for category in MealCategory::ALL {
        let allowed = menu.category(category);
        for item in selection.category_mut(category).iter_mut() {
            match allowed
                .iter()
                .find(|name| name.to_lowercase() == item.to_lowercase())
            {
                Some(name) => *item = name.clone(),
                None => {
                    return Err(ApiError::Validation(format!(
                        "\"{item}\" is not on the {category} menu for {day}"
                    )))
                }
            }
        }
    }
    for entry in &selection.others {
        if !OTHERS_SENTINELS.contains(&entry.as_str()) {
            return Err(ApiError::Validation(format!(
                "\"{entry}\" is not one of the fixed absence options"
            )));
        }
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::{OUT_ALL_DAY, SKIP_BREAKFAST};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn menu_for(day: &str) -> DayMenu {
        let mut menu = DayMenu::empty(date(day));
        menu.breakfast = vec!["Idli".to_string(), "Masala Dosa".to_string()];
        menu.lunch = vec!["Veg Biryani".to_string()];
        menu
    }

    #[test]
    fn selection_items_take_the_menu_spelling() {
        let selection = MealSelection {
            breakfast: vec!["  idli ".to_string()],
            lunch: vec!["VEG BIRYANI".to_string()],
            ..Default::default()
        }
        .normalize();

        let validated =
            validate_selection(date("2025-03-14"), &menu_for("2025-03-14"), selection).unwrap();
        assert_eq!(validated.breakfast, vec!["Idli".to_string()]);
        assert_eq!(validated.lunch, vec!["Veg Biryani".to_string()]);
    }

    #[test]
    fn off_menu_items_are_rejected_with_context() {
        let selection = MealSelection {
            breakfast: vec!["Pancakes".to_string()],
            ..Default::default()
        };
        let err = validate_selection(date("2025-03-14"), &menu_for("2025-03-14"), selection)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Pancakes"));
        assert!(msg.contains("breakfast"));
        assert!(msg.contains("2025-03-14"));
    }

    #[test]
    fn absence_only_selections_cannot_target_days_outside_the_window() {
        let today = date("2025-03-14");
        let far = date("2099-01-01");
        let selection = MealSelection {
            others: vec![SKIP_BREAKFAST.to_string()],
            ..Default::default()
        }
        .normalize();

        // Absence options validate against any day's menu, planned or not;
        // the window bound is the only day gate on a submission.
        assert!(validate_selection(far, &DayMenu::empty(far), selection).is_ok());
        assert!(ensure_in_window(far, today).is_err());
        assert!(ensure_in_window(today, today).is_ok());
    }

    #[test]
    fn sentinels_pass_and_unknown_others_fail() {
        let ok = MealSelection {
            others: vec![SKIP_BREAKFAST.to_string(), OUT_ALL_DAY.to_string()],
            ..Default::default()
        }
        .normalize();
        // Dominance already dropped the full-day sentinel; what remains is valid.
        assert!(validate_selection(date("2025-03-14"), &menu_for("2025-03-14"), ok).is_ok());

        let bad = MealSelection {
            others: vec!["On a diet".to_string()],
            ..Default::default()
        };
        assert!(
            validate_selection(date("2025-03-14"), &menu_for("2025-03-14"), bad).is_err()
        );
    }
}
