use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// DB row struct for one catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry plus the meal categories it may be planned under.
#[derive(Debug, Clone, Serialize)]
pub struct FoodItemWithCategories {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
}
