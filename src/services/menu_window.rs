use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::models::menu::{
    DayMenu, MealCategory, MenuWindow, OTHERS_SENTINELS, SetDayMenuRequest, StoredDay,
};
use crate::services::catalog::CatalogService;
use crate::store::MenuStore;

/// Number of days the window spans, today included.
pub const WINDOW_DAYS: i64 = 7;

pub const MENU_WINDOW_KEY: &str = "mess:menu:window";
pub const LAST_ROLLOVER_KEY: &str = "mess:menu:last_rollover";

/// Owns the cached rolling menu window: loads and validates the blob,
/// serves day reads, applies authoring writes and performs the daily
/// rollover.
#[derive(Clone)]
pub struct MenuWindowManager {
    store: Arc<dyn MenuStore>,
}

impl MenuWindowManager {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self { store }
    }

    /// Load the stored window. A blob that fails structural validation is
    /// discarded and replaced with an empty window, never partially trusted.
    pub async fn load_window(&self) -> Result<MenuWindow, ApiError> {
        match self.store.get(MENU_WINDOW_KEY).await? {
            Some(raw) => match MenuWindow::parse(&raw) {
                Some(window) => Ok(window),
                None => {
                    warn!("stored menu window failed validation, reinitializing empty");
                    self.store.clear(MENU_WINDOW_KEY).await?;
                    Ok(MenuWindow::default())
                }
            },
            None => Ok(MenuWindow::default()),
        }
    }

    async fn save_window(&self, window: &MenuWindow) -> Result<(), ApiError> {
        self.store.set(MENU_WINDOW_KEY, &window.to_json()?).await
    }

    pub async fn day(&self, date: NaiveDate) -> Result<DayMenu, ApiError> {
        Ok(self.load_window().await?.day(date))
    }

    /// The seven days starting at `today`, unplanned days served empty.
    pub async fn window(&self, today: NaiveDate) -> Result<Vec<DayMenu>, ApiError> {
        let window = self.load_window().await?;
        Ok((0..WINDOW_DAYS)
            .map(|offset| window.day(today + Duration::days(offset)))
            .collect())
    }

    /// Replace one day's menu. Every item must exist in the catalog under
    /// the category it is planned for; the stored spelling is the catalog's.
    /// Writes outside the current window are rejected.
    pub async fn set_day(
        &self,
        pool: &PgPool,
        date: NaiveDate,
        today: NaiveDate,
        req: &SetDayMenuRequest,
    ) -> Result<DayMenu, ApiError> {
        ensure_in_window(date, today)?;

        let catalog = CatalogService::names_by_category(pool).await?;
        let mut stored = StoredDay::fresh();
        for category in MealCategory::ALL {
            *stored.category_mut(category) =
                validate_items(date, category, req.category(category), &catalog)?;
        }

        let mut window = self.load_window().await?;
        window.set_day(date, stored);
        self.save_window(&window).await?;
        info!("menu for {date} replaced");
        Ok(window.day(date))
    }

    /// Run the midnight rollover if it hasn't run for `today` yet: drop
    /// days behind `today`, create missing days through `today + 6`, and
    /// record the day. Calling it again the same day is a no-op.
    pub async fn rollover_if_needed(&self, today: NaiveDate) -> Result<bool, ApiError> {
        if let Some(last) = self.last_rollover().await? {
            if last >= today {
                return Ok(false);
            }
        }

        let mut window = self.load_window().await?;
        window.retain_from(today);
        window.ensure_through(today, WINDOW_DAYS);
        self.save_window(&window).await?;
        self.store
            .set(LAST_ROLLOVER_KEY, &today.format("%Y-%m-%d").to_string())
            .await?;
        Ok(true)
    }

    // An unreadable marker counts as never rolled; the next tick repairs it.
    async fn last_rollover(&self) -> Result<Option<NaiveDate>, ApiError> {
        Ok(self
            .store
            .get(LAST_ROLLOVER_KEY)
            .await?
            .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()))
    }
}

/// Reject dates the window does not cover: `today` inclusive through
/// `today + WINDOW_DAYS` exclusive. Menu writes and vote submissions share
/// this bound.
pub(crate) fn ensure_in_window(date: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if date < today || date >= today + Duration::days(WINDOW_DAYS) {
        return Err(ApiError::Validation(format!(
            "{date} is outside the current menu window"
        )));
    }
    Ok(())
}

/// Trim, dedupe and resolve authored items against the catalog, returning
/// the catalog's canonical spellings. Absence options are reserved names
/// and never validate, whatever the catalog contains.
fn validate_items(
    date: NaiveDate,
    category: MealCategory,
    raw: &[String],
    catalog: &HashMap<MealCategory, Vec<String>>,
) -> Result<Vec<String>, ApiError> {
    let allowed = catalog.get(&category).map(Vec::as_slice).unwrap_or(&[]);
    let mut seen = std::collections::HashSet::new();
    let mut items = Vec::new();

    for raw_item in raw {
        let trimmed = raw_item.trim();
        if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        if OTHERS_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
            return Err(ApiError::Validation(format!(
                "\"{trimmed}\" is a reserved absence option, not a {category} item (menu for {date})"
            )));
        }
        match allowed
            .iter()
            .find(|name| name.to_lowercase() == trimmed.to_lowercase())
        {
            Some(name) => items.push(name.clone()),
            None => {
                return Err(ApiError::Validation(format!(
                    "\"{trimmed}\" is not a {category} catalog item (menu for {date})"
                )))
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::SKIP_LUNCH;
    use crate::store::MemoryMenuStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn manager() -> (MenuWindowManager, Arc<MemoryMenuStore>) {
        let store = Arc::new(MemoryMenuStore::new());
        (MenuWindowManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn first_rollover_builds_a_full_window() {
        let (manager, _) = manager();
        let today = date("2025-03-14");

        assert!(manager.rollover_if_needed(today).await.unwrap());
        let window = manager.load_window().await.unwrap();
        assert_eq!(window.len(), 7);
        assert!(window.contains(today));
        assert!(window.contains(date("2025-03-20")));

        // Same day again: nothing to do.
        assert!(!manager.rollover_if_needed(today).await.unwrap());
    }

    #[tokio::test]
    async fn rollover_drops_yesterday_and_appends_a_day() {
        let (manager, store) = manager();
        let today = date("2025-03-14");
        manager.rollover_if_needed(today).await.unwrap();

        // Plan something on a surviving day to prove content is preserved.
        let mut window = manager.load_window().await.unwrap();
        let mut day = StoredDay::fresh();
        day.lunch = vec!["Veg Biryani".to_string()];
        window.set_day(date("2025-03-15"), day);
        store
            .set(MENU_WINDOW_KEY, &window.to_json().unwrap())
            .await
            .unwrap();

        let tomorrow = date("2025-03-15");
        assert!(manager.rollover_if_needed(tomorrow).await.unwrap());

        let window = manager.load_window().await.unwrap();
        assert_eq!(window.len(), 7);
        assert!(!window.contains(today));
        assert!(window.contains(date("2025-03-21")));
        assert_eq!(
            window.day(tomorrow).lunch,
            vec!["Veg Biryani".to_string()]
        );
    }

    #[tokio::test]
    async fn rollover_after_downtime_fills_every_missing_day() {
        let (manager, _) = manager();
        manager.rollover_if_needed(date("2025-03-14")).await.unwrap();

        // Service was down for a while; next check happens days later.
        let later = date("2025-03-18");
        assert!(manager.rollover_if_needed(later).await.unwrap());

        let window = manager.load_window().await.unwrap();
        assert_eq!(window.len(), 7);
        assert!(window.contains(later));
        assert!(window.contains(date("2025-03-24")));
        assert!(!window.contains(date("2025-03-17")));
    }

    #[tokio::test]
    async fn malformed_blob_is_reinitialized_empty() {
        let (manager, store) = manager();
        store.set(MENU_WINDOW_KEY, "{not json").await.unwrap();

        let window = manager.load_window().await.unwrap();
        assert!(window.is_empty());
        // The bad blob is gone from the store as well.
        assert!(store.get(MENU_WINDOW_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unplanned_days_read_as_empty_with_sentinels() {
        let (manager, _) = manager();
        let day = manager.day(date("2025-03-14")).await.unwrap();
        assert!(day.breakfast.is_empty());
        assert_eq!(day.others, OTHERS_SENTINELS.to_vec());

        let window = manager.window(date("2025-03-14")).await.unwrap();
        assert_eq!(window.len(), 7);
        assert_eq!(window[6].date, date("2025-03-20"));
    }

    #[test]
    fn window_bounds_cover_today_through_day_six() {
        let today = date("2025-03-14");
        assert!(ensure_in_window(today, today).is_ok());
        assert!(ensure_in_window(date("2025-03-20"), today).is_ok());
        assert!(ensure_in_window(date("2025-03-13"), today).is_err());
        assert!(ensure_in_window(date("2025-03-21"), today).is_err());
    }

    #[test]
    fn absence_options_are_rejected_as_menu_items() {
        let mut catalog = HashMap::new();
        // A catalog row shadowing an absence option must not make it plannable.
        catalog.insert(
            MealCategory::Lunch,
            vec![SKIP_LUNCH.to_string(), "Veg Biryani".to_string()],
        );

        let err = validate_items(
            date("2025-03-14"),
            MealCategory::Lunch,
            &["not having LUNCH".to_string()],
            &catalog,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reserved"));

        let items = validate_items(
            date("2025-03-14"),
            MealCategory::Lunch,
            &["Veg Biryani".to_string()],
            &catalog,
        )
        .unwrap();
        assert_eq!(items, vec!["Veg Biryani".to_string()]);
    }

    #[test]
    fn validate_items_canonicalizes_against_the_catalog() {
        let mut catalog = HashMap::new();
        catalog.insert(
            MealCategory::Breakfast,
            vec!["Idli".to_string(), "Masala Dosa".to_string()],
        );

        let items = validate_items(
            date("2025-03-14"),
            MealCategory::Breakfast,
            &[" idli ".to_string(), "IDLI".to_string(), "Masala Dosa".to_string()],
            &catalog,
        )
        .unwrap();
        assert_eq!(items, vec!["Idli".to_string(), "Masala Dosa".to_string()]);

        let err = validate_items(
            date("2025-03-14"),
            MealCategory::Breakfast,
            &["Pizza".to_string()],
            &catalog,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Pizza"));
        assert!(msg.contains("breakfast"));
        assert!(msg.contains("2025-03-14"));
    }
}
