use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::catalog::{FoodItem, FoodItemWithCategories};
use crate::models::menu::MealCategory;

/// Read-only lookups against the food catalog. Catalog CRUD lives in the
/// admin tooling; the API only consumes it.
pub struct CatalogService;

impl CatalogService {
    /// Every catalog entry with the categories it may be planned under.
    pub async fn list(pool: &PgPool) -> Result<Vec<FoodItemWithCategories>, ApiError> {
        let items = sqlx::query_as::<_, FoodItem>(
            "SELECT id, name, image_url, description, created_at, updated_at
             FROM food_items
             ORDER BY name",
        )
        .fetch_all(pool)
        .await?;

        let pairs = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT food_item_id, category::TEXT FROM food_item_categories",
        )
        .fetch_all(pool)
        .await?;

        let mut by_item: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (id, category) in pairs {
            by_item.entry(id).or_default().push(category);
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let mut categories = by_item.remove(&item.id).unwrap_or_default();
                categories.sort();
                FoodItemWithCategories {
                    id: item.id,
                    name: item.name,
                    image_url: item.image_url,
                    description: item.description,
                    categories,
                }
            })
            .collect())
    }

    /// Catalog names grouped by category, for menu authoring validation.
    pub async fn names_by_category(
        pool: &PgPool,
    ) -> Result<HashMap<MealCategory, Vec<String>>, ApiError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT fic.category::TEXT, fi.name
             FROM food_item_categories fic
             JOIN food_items fi ON fi.id = fic.food_item_id
             ORDER BY fi.name",
        )
        .fetch_all(pool)
        .await?;

        let mut by_category: HashMap<MealCategory, Vec<String>> = HashMap::new();
        for (category, name) in rows {
            let category: MealCategory = category
                .parse()
                .map_err(|e: anyhow::Error| ApiError::Internal(e.to_string()))?;
            by_category.entry(category).or_default().push(name);
        }
        Ok(by_category)
    }
}
