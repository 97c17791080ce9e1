use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::menu::{MealCategory, OUT_ALL_DAY};

/// Category key a vote record is filed under: the four meals plus the
/// "others" sentinel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteCategory {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
    Others,
}

impl VoteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteCategory::Breakfast => "breakfast",
            VoteCategory::Lunch => "lunch",
            VoteCategory::Snacks => "snacks",
            VoteCategory::Dinner => "dinner",
            VoteCategory::Others => "others",
        }
    }
}

impl std::fmt::Display for VoteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VoteCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(VoteCategory::Breakfast),
            "lunch" => Ok(VoteCategory::Lunch),
            "snacks" => Ok(VoteCategory::Snacks),
            "dinner" => Ok(VoteCategory::Dinner),
            "others" => Ok(VoteCategory::Others),
            _ => Err(anyhow::anyhow!("Unknown vote category: {s}")),
        }
    }
}

impl From<MealCategory> for VoteCategory {
    fn from(category: MealCategory) -> Self {
        match category {
            MealCategory::Breakfast => VoteCategory::Breakfast,
            MealCategory::Lunch => VoteCategory::Lunch,
            MealCategory::Snacks => VoteCategory::Snacks,
            MealCategory::Dinner => VoteCategory::Dinner,
        }
    }
}

/// What a student picked for one day, across all categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MealSelection {
    #[serde(default)]
    pub breakfast: Vec<String>,
    #[serde(default)]
    pub lunch: Vec<String>,
    #[serde(default)]
    pub snacks: Vec<String>,
    #[serde(default)]
    pub dinner: Vec<String>,
    #[serde(default)]
    pub others: Vec<String>,
}

impl MealSelection {
    pub fn category(&self, category: MealCategory) -> &[String] {
        match category {
            MealCategory::Breakfast => &self.breakfast,
            MealCategory::Lunch => &self.lunch,
            MealCategory::Snacks => &self.snacks,
            MealCategory::Dinner => &self.dinner,
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

    pub fn is_empty(&self) -> bool {
        self.breakfast.is_empty()
            && self.lunch.is_empty()
            && self.snacks.is_empty()
            && self.dinner.is_empty()
            && self.others.is_empty()
    }

    pub fn push(&mut self, category: VoteCategory, item: String) {
        match category {
            VoteCategory::Breakfast => self.breakfast.push(item),
            VoteCategory::Lunch => self.lunch.push(item),
            VoteCategory::Snacks => self.snacks.push(item),
            VoteCategory::Dinner => self.dinner.push(item),
            VoteCategory::Others => self.others.push(item),
        }
    }

    /// Non-empty categories, meals first, others last.
    pub fn categories_present(&self) -> Vec<VoteCategory> {
        let mut present: Vec<VoteCategory> = MealCategory::ALL
            .iter()
            .filter(|c| !self.category(**c).is_empty())
            .map(|c| VoteCategory::from(*c))
            .collect();
        if !self.others.is_empty() {
            present.push(VoteCategory::Others);
        }
        present
    }

    /// Trim, drop empties, dedupe case-insensitively, then apply sentinel
    /// dominance: a per-meal sentinel clears that meal and the full-day
    /// sentinel; the full-day sentinel alone clears all four meals.
    /// Applying this twice changes nothing.
    pub fn normalize(&self) -> MealSelection {
        let mut out = MealSelection {
            breakfast: tidy(&self.breakfast),
            lunch: tidy(&self.lunch),
            snacks: tidy(&self.snacks),
            dinner: tidy(&self.dinner),
            others: tidy(&self.others),
        };

        let skipped: Vec<MealCategory> = MealCategory::ALL
            .iter()
            .copied()
            .filter(|c| out.others.iter().any(|o| o == c.skip_sentinel()))
            .collect();

        if !skipped.is_empty() {
            out.others.retain(|o| o != OUT_ALL_DAY);
            for category in skipped {
                out.category_mut(category).clear();
            }
        } else if out.others.iter().any(|o| o == OUT_ALL_DAY) {
            out.breakfast.clear();
            out.lunch.clear();
            out.snacks.clear();
            out.dinner.clear();
        }

        out
    }
}

fn tidy(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_owned)
        .collect()
}

/// Body for POST /votes. `edit` replaces the whole existing submission.
#[derive(Debug, Deserialize)]
pub struct SubmitVoteRequest {
    pub day: NaiveDate,
    #[serde(default)]
    pub edit: bool,
    pub selection: MealSelection,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemCount {
    pub item: String,
    pub votes: i64,
}

/// Aggregated per-item tallies for one day. Votes count distinct students.
#[derive(Debug, Clone, Serialize)]
pub struct DayCounts {
    pub day: NaiveDate,
    pub total_eligible: i64,
    pub voted: i64,
    pub breakfast: Vec<ItemCount>,
    pub lunch: Vec<ItemCount>,
    pub snacks: Vec<ItemCount>,
    pub dinner: Vec<ItemCount>,
    pub others: Vec<ItemCount>,
}

impl DayCounts {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_eligible: 0,
            voted: 0,
            breakfast: Vec::new(),
            lunch: Vec::new(),
            snacks: Vec::new(),
            dinner: Vec::new(),
            others: Vec::new(),
        }
    }

    pub fn category_mut(&mut self, category: VoteCategory) -> &mut Vec<ItemCount> {
        match category {
            VoteCategory::Breakfast => &mut self.breakfast,
            VoteCategory::Lunch => &mut self.lunch,
            VoteCategory::Snacks => &mut self.snacks,
            VoteCategory::Dinner => &mut self.dinner,
            VoteCategory::Others => &mut self.others,
        }
    }
}

/// Response for GET /votes/{date}/mine.
#[derive(Debug, Serialize)]
pub struct MyVotes {
    pub day: NaiveDate,
    pub selection: MealSelection,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::menu::{SKIP_BREAKFAST, SKIP_LUNCH};

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn full_day_sentinel_clears_all_meals() {
        let selection = MealSelection {
            breakfast: items(&["Idli"]),
            lunch: items(&["Veg Biryani"]),
            dinner: items(&["Chapati"]),
            others: items(&[OUT_ALL_DAY]),
            ..Default::default()
        };
        let normalized = selection.normalize();
        assert!(normalized.breakfast.is_empty());
        assert!(normalized.lunch.is_empty());
        assert!(normalized.snacks.is_empty());
        assert!(normalized.dinner.is_empty());
        assert_eq!(normalized.others, items(&[OUT_ALL_DAY]));
    }

    #[test]
    fn per_meal_sentinel_clears_only_that_meal_and_full_day() {
        let selection = MealSelection {
            breakfast: items(&["Idli"]),
            lunch: items(&["Veg Biryani"]),
            others: items(&[SKIP_BREAKFAST, OUT_ALL_DAY]),
            ..Default::default()
        };
        let normalized = selection.normalize();
        assert!(normalized.breakfast.is_empty());
        assert_eq!(normalized.lunch, items(&["Veg Biryani"]));
        assert_eq!(normalized.others, items(&[SKIP_BREAKFAST]));
    }

    #[test]
    fn two_per_meal_sentinels_clear_both_meals() {
        let selection = MealSelection {
            breakfast: items(&["Idli"]),
            lunch: items(&["Veg Biryani"]),
            snacks: items(&["Samosa"]),
            others: items(&[SKIP_BREAKFAST, SKIP_LUNCH]),
            ..Default::default()
        };
        let normalized = selection.normalize();
        assert!(normalized.breakfast.is_empty());
        assert!(normalized.lunch.is_empty());
        assert_eq!(normalized.snacks, items(&["Samosa"]));
        assert_eq!(normalized.others, items(&[SKIP_BREAKFAST, SKIP_LUNCH]));
    }

    #[test]
    fn normalize_is_idempotent() {
        let selection = MealSelection {
            breakfast: items(&[" Idli ", "idli", "Vada"]),
            others: items(&[SKIP_LUNCH, OUT_ALL_DAY]),
            ..Default::default()
        };
        let once = selection.normalize();
        assert_eq!(once.normalize(), once);
    }

    #[test]
    fn tidy_trims_and_dedupes_case_insensitively() {
        let selection = MealSelection {
            dinner: items(&[" Chapati ", "chapati", "", "Paneer Butter Masala"]),
            ..Default::default()
        };
        let normalized = selection.normalize();
        assert_eq!(normalized.dinner, items(&["Chapati", "Paneer Butter Masala"]));
    }

    #[test]
    fn categories_present_lists_meals_then_others() {
        let selection = MealSelection {
            lunch: items(&["Curd Rice"]),
            others: items(&[SKIP_BREAKFAST]),
            ..Default::default()
        };
        assert_eq!(
            selection.categories_present(),
            vec![VoteCategory::Lunch, VoteCategory::Others]
        );
        assert!(MealSelection::default().is_empty());
    }
}
