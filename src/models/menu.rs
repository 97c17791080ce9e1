use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed absence options shown under "others" for every day.
pub const SKIP_BREAKFAST: &str = "Not having breakfast";
pub const SKIP_LUNCH: &str = "Not having lunch";
pub const SKIP_SNACKS: &str = "Not having snacks";
pub const SKIP_DINNER: &str = "Not having dinner";
pub const OUT_ALL_DAY: &str = "Out of mess all day";

pub const OTHERS_SENTINELS: [&str; 5] = [
    SKIP_BREAKFAST,
    SKIP_LUNCH,
    SKIP_SNACKS,
    SKIP_DINNER,
    OUT_ALL_DAY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

impl MealCategory {
    pub const ALL: [MealCategory; 4] = [
        MealCategory::Breakfast,
        MealCategory::Lunch,
        MealCategory::Snacks,
        MealCategory::Dinner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => "breakfast",
            MealCategory::Lunch => "lunch",
            MealCategory::Snacks => "snacks",
            MealCategory::Dinner => "dinner",
        }
    }

    /// The per-meal absence sentinel for this category.
    pub fn skip_sentinel(&self) -> &'static str {
        match self {
            MealCategory::Breakfast => SKIP_BREAKFAST,
            MealCategory::Lunch => SKIP_LUNCH,
            MealCategory::Snacks => SKIP_SNACKS,
            MealCategory::Dinner => SKIP_DINNER,
        }
    }
}

impl std::fmt::Display for MealCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MealCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealCategory::Breakfast),
            "lunch" => Ok(MealCategory::Lunch),
            "snacks" => Ok(MealCategory::Snacks),
            "dinner" => Ok(MealCategory::Dinner),
            _ => Err(anyhow::anyhow!("Unknown meal category: {s}")),
        }
    }
}

/// Per-day payload as persisted inside the cached window blob.
/// Exactly five array fields; anything else fails window validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoredDay {
    pub breakfast: Vec<String>,
    pub lunch: Vec<String>,
    pub snacks: Vec<String>,
    pub dinner: Vec<String>,
    pub others: Vec<String>,
}

impl StoredDay {
    /// A freshly planned day: empty meals, fixed sentinel list.
    pub fn fresh() -> Self {
        Self {
            breakfast: Vec::new(),
            lunch: Vec::new(),
            snacks: Vec::new(),
            dinner: Vec::new(),
            others: OTHERS_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn category_mut(&mut self, category: MealCategory) -> &mut Vec<String> {
        match category {
            MealCategory::Breakfast => &mut self.breakfast,
            MealCategory::Lunch => &mut self.lunch,
            MealCategory::Snacks => &mut self.snacks,
            MealCategory::Dinner => &mut self.dinner,
        }
    }
}

/// One day of the menu window as served to clients.
/// "others" is always the fixed sentinel list, whatever is stored.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayMenu {
    pub date: NaiveDate,
    pub breakfast: Vec<String>,
    pub lunch: Vec<String>,
    pub snacks: Vec<String>,
    pub dinner: Vec<String>,
    pub others: Vec<String>,
}

impl DayMenu {
    pub fn empty(date: NaiveDate) -> Self {
        Self::from_stored(date, &StoredDay::fresh())
    }

    pub fn from_stored(date: NaiveDate, stored: &StoredDay) -> Self {
        Self {
            date,
            breakfast: stored.breakfast.clone(),
            lunch: stored.lunch.clone(),
            snacks: stored.snacks.clone(),
            dinner: stored.dinner.clone(),
            others: OTHERS_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn category(&self, category: MealCategory) -> &[String] {
        match category {
            MealCategory::Breakfast => &self.breakfast,
            MealCategory::Lunch => &self.lunch,
            MealCategory::Snacks => &self.snacks,
            MealCategory::Dinner => &self.dinner,
        }
    }
}

/// The rolling 7-day menu map, keyed by calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuWindow {
    days: BTreeMap<NaiveDate, StoredDay>,
}

impl MenuWindow {
    /// Parse and structurally validate a cached window blob. Every key must
    /// be an ISO date and every value a five-array day object; any deviation
    /// invalidates the whole blob.
    pub fn parse(raw: &str) -> Option<Self> {
        let map: BTreeMap<String, StoredDay> = serde_json::from_str(raw).ok()?;
        let mut days = BTreeMap::new();
        for (key, stored) in map {
            let date = NaiveDate::parse_from_str(&key, "%Y-%m-%d").ok()?;
            days.insert(date, stored);
        }
        Some(Self { days })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let map: BTreeMap<String, &StoredDay> = self
            .days
            .iter()
            .map(|(date, day)| (date.format("%Y-%m-%d").to_string(), day))
            .collect();
        serde_json::to_string(&map)
    }

    pub fn day(&self, date: NaiveDate) -> DayMenu {
        match self.days.get(&date) {
            Some(stored) => DayMenu::from_stored(date, stored),
            None => DayMenu::empty(date),
        }
    }

    pub fn set_day(&mut self, date: NaiveDate, day: StoredDay) {
        self.days.insert(date, day);
    }

    /// Drop every day strictly before `today`.
    pub fn retain_from(&mut self, today: NaiveDate) {
        self.days.retain(|date, _| *date >= today);
    }

    /// Create any missing day between `today` and `today + horizon - 1`.
    pub fn ensure_through(&mut self, today: NaiveDate, horizon: i64) {
        for offset in 0..horizon {
            let date = today + chrono::Duration::days(offset);
            self.days.entry(date).or_insert_with(StoredDay::fresh);
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Body for PUT /menu/{date} (full replacement, no partial merge).
#[derive(Debug, Deserialize)]
pub struct SetDayMenuRequest {
    pub breakfast: Vec<String>,
    pub lunch: Vec<String>,
    pub snacks: Vec<String>,
    pub dinner: Vec<String>,
}

impl SetDayMenuRequest {
    pub fn category(&self, category: MealCategory) -> &[String] {
        match category {
            MealCategory::Breakfast => &self.breakfast,
            MealCategory::Lunch => &self.lunch,
            MealCategory::Snacks => &self.snacks,
            MealCategory::Dinner => &self.dinner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_accepts_well_formed_window() {
        let raw = r#"{
            "2025-03-14": {
                "breakfast": ["Idli", "Vada"],
                "lunch": [],
                "snacks": [],
                "dinner": ["Chapati"],
                "others": []
            }
        }"#;
        let window = MenuWindow::parse(raw).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(
            window.day(date("2025-03-14")).breakfast,
            vec!["Idli".to_string(), "Vada".to_string()]
        );
    }

    #[test]
    fn parse_rejects_bad_date_key() {
        let raw = r#"{"14-03-2025": {"breakfast": [], "lunch": [], "snacks": [], "dinner": [], "others": []}}"#;
        assert!(MenuWindow::parse(raw).is_none());
    }

    #[test]
    fn parse_rejects_missing_category_field() {
        let raw = r#"{"2025-03-14": {"breakfast": [], "lunch": [], "snacks": [], "dinner": []}}"#;
        assert!(MenuWindow::parse(raw).is_none());
    }

    #[test]
    fn parse_rejects_non_array_category() {
        let raw = r#"{"2025-03-14": {"breakfast": "Idli", "lunch": [], "snacks": [], "dinner": [], "others": []}}"#;
        assert!(MenuWindow::parse(raw).is_none());
    }

    #[test]
    fn day_always_serves_fixed_sentinels() {
        let mut window = MenuWindow::default();
        let mut stored = StoredDay::fresh();
        stored.others = vec!["stale entry".to_string()];
        window.set_day(date("2025-03-14"), stored);

        let served = window.day(date("2025-03-14"));
        assert_eq!(served.others, OTHERS_SENTINELS.to_vec());
        // Unplanned days serve the same fixed list.
        assert_eq!(window.day(date("2025-03-15")).others, OTHERS_SENTINELS.to_vec());
    }

    #[test]
    fn retain_and_ensure_rebuild_the_window() {
        let mut window = MenuWindow::default();
        window.ensure_through(date("2025-03-14"), 7);
        assert_eq!(window.len(), 7);

        window.retain_from(date("2025-03-15"));
        assert_eq!(window.len(), 6);
        assert!(!window.contains(date("2025-03-14")));

        window.ensure_through(date("2025-03-15"), 7);
        assert_eq!(window.len(), 7);
        assert!(window.contains(date("2025-03-21")));
    }

    #[test]
    fn json_round_trip_preserves_days() {
        let mut window = MenuWindow::default();
        let mut stored = StoredDay::fresh();
        stored.lunch = vec!["Veg Biryani".to_string()];
        window.set_day(date("2025-03-14"), stored);

        let parsed = MenuWindow::parse(&window.to_json().unwrap()).unwrap();
        assert_eq!(parsed, window);
    }
}
