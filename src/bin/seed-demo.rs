//! Demo data seed script
//!
//! Resets the mess hall database and seeds it with realistic demo data:
//! - 12 students on the roster (one of them no longer enrolled)
//! - A food catalog of ~20 items across the four meal categories
//! - A planned menu for every day of the current 7-day window
//! - A handful of votes and complaints for today
//!
//! Usage:
//!   DATABASE_URL=... REDIS_URL=... ./seed-demo
//!
//! Environment variables:
//!   DATABASE_URL — PostgreSQL connection string (required)
//!   REDIS_URL    — Redis connection string (default: redis://127.0.0.1:6379)

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use messhall_api::models::complaint::SubmitComplaintRequest;
use messhall_api::models::menu::{MealCategory, SetDayMenuRequest, OUT_ALL_DAY, SKIP_BREAKFAST};
use messhall_api::models::session::StudentSession;
use messhall_api::models::vote::{MealSelection, SubmitVoteRequest};
use messhall_api::services::changefeed::ChangeFeed;
use messhall_api::services::complaints::ComplaintLedger;
use messhall_api::services::menu_window::{
    MenuWindowManager, LAST_ROLLOVER_KEY, MENU_WINDOW_KEY,
};
use messhall_api::services::votes::VoteLedger;
use messhall_api::store::{MenuStore, RedisMenuStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let redis_url =
        env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    println!("=== Seed Demo Data ===");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let redis_client = redis::Client::open(redis_url.as_str()).context("Invalid REDIS_URL")?;
    let redis_conn = redis_client
        .get_multiplexed_async_connection()
        .await
        .context("Failed to connect to Redis")?;

    let store = Arc::new(RedisMenuStore::new(redis_conn.clone()));
    let menu = MenuWindowManager::new(store.clone());
    let feed = ChangeFeed::new(redis_conn);

    // 1. Clean existing data
    println!("Cleaning existing data...");
    for table in [
        "votes",
        "vote_submissions",
        "complaints",
        "food_item_categories",
        "food_items",
        "students",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&pool)
            .await
            .with_context(|| format!("Failed to clean {table}"))?;
    }
    store.clear(MENU_WINDOW_KEY).await?;
    store.clear(LAST_ROLLOVER_KEY).await?;

    // 2. Roster
    println!("Inserting students...");
    let students = [
        ("H-2024-001", "Aarav Sharma",    "A-101", true),
        ("H-2024-002", "Diya Patel",      "A-102", true),
        ("H-2024-003", "Vihaan Gupta",    "A-104", true),
        ("H-2024-004", "Ananya Iyer",     "A-107", true),
        ("H-2023-011", "Ishaan Reddy",    "B-201", true),
        ("H-2023-012", "Meera Nair",      "B-203", true),
        ("H-2023-013", "Kabir Singh",     "B-205", true),
        ("H-2023-014", "Sara Khan",       "B-208", true),
        ("H-2022-021", "Arjun Menon",     "C-301", true),
        ("H-2022-022", "Tara Joshi",      "C-304", true),
        ("H-2022-023", "Dev Malhotra",    "C-306", true),
        ("H-2021-117", "Rohan Verma",     "C-310", false), // left the hostel
    ];

    for (id, name, room, enrolled) in &students {
        sqlx::query(
            "INSERT INTO students (id, name, room_no, enrolled) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(name)
        .bind(room)
        .bind(enrolled)
        .execute(&pool)
        .await
        .with_context(|| format!("Failed to insert student {id}"))?;
    }

    // 3. Food catalog
    println!("Inserting food catalog...");
    use MealCategory::{Breakfast, Dinner, Lunch, Snacks};
    let catalog: &[(&str, &[MealCategory])] = &[
        ("Idli",                 &[Breakfast]),
        ("Masala Dosa",          &[Breakfast]),
        ("Poha",                 &[Breakfast]),
        ("Aloo Paratha",         &[Breakfast]),
        ("Upma",                 &[Breakfast]),
        ("Bread Omelette",       &[Breakfast]),
        ("Veg Biryani",          &[Lunch]),
        ("Curd Rice",            &[Lunch]),
        ("Rajma Chawal",         &[Lunch]),
        ("Chole Bhature",        &[Lunch]),
        ("Steamed Rice",         &[Lunch, Dinner]),
        ("Dal Tadka",            &[Lunch, Dinner]),
        ("Chapati",              &[Lunch, Dinner]),
        ("Samosa",               &[Snacks]),
        ("Vada Pav",             &[Snacks]),
        ("Bread Pakora",         &[Snacks]),
        ("Masala Chai",          &[Snacks]),
        ("Filter Coffee",        &[Snacks]),
        ("Paneer Butter Masala", &[Dinner]),
        ("Mixed Veg Curry",      &[Dinner]),
        ("Jeera Rice",           &[Dinner]),
        ("Veg Pulao",            &[Dinner]),
    ];

    for (name, categories) in catalog {
        let id: Uuid =
            sqlx::query_scalar("INSERT INTO food_items (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&pool)
                .await
                .with_context(|| format!("Failed to insert food item {name}"))?;
        for category in *categories {
            sqlx::query(
                "INSERT INTO food_item_categories (food_item_id, category)
                 VALUES ($1, $2::meal_category)",
            )
            .bind(id)
            .bind(category.to_string())
            .execute(&pool)
            .await
            .with_context(|| format!("Failed to link {name} to {category}"))?;
        }
    }

    // 4. Menu window
    println!("Planning the menu window...");
    let today = Local::now().date_naive();
    menu.rollover_if_needed(today)
        .await
        .context("Failed to initialize menu window")?;

    // breakfast, lunch, snacks, dinner per day, cycling through the week.
    let week_plan: [(&[&str], &[&str], &[&str], &[&str]); 7] = [
        (
            &["Idli", "Upma"],
            &["Veg Biryani", "Dal Tadka", "Chapati"],
            &["Samosa", "Masala Chai"],
            &["Paneer Butter Masala", "Chapati", "Jeera Rice"],
        ),
        (
            &["Masala Dosa", "Poha"],
            &["Rajma Chawal", "Curd Rice"],
            &["Vada Pav", "Filter Coffee"],
            &["Mixed Veg Curry", "Chapati", "Steamed Rice"],
        ),
        (
            &["Aloo Paratha", "Bread Omelette"],
            &["Chole Bhature", "Steamed Rice", "Dal Tadka"],
            &["Bread Pakora", "Masala Chai"],
            &["Veg Pulao", "Mixed Veg Curry"],
        ),
        (
            &["Idli", "Masala Dosa"],
            &["Curd Rice", "Chapati", "Dal Tadka"],
            &["Samosa", "Filter Coffee"],
            &["Paneer Butter Masala", "Jeera Rice"],
        ),
        (
            &["Poha", "Upma"],
            &["Veg Biryani", "Curd Rice"],
            &["Vada Pav", "Masala Chai"],
            &["Mixed Veg Curry", "Chapati", "Steamed Rice"],
        ),
        (
            &["Bread Omelette", "Idli"],
            &["Rajma Chawal", "Steamed Rice", "Chapati"],
            &["Bread Pakora", "Filter Coffee"],
            &["Veg Pulao", "Dal Tadka"],
        ),
        (
            &["Aloo Paratha", "Poha"],
            &["Chole Bhature", "Curd Rice"],
            &["Samosa", "Masala Chai"],
            &["Paneer Butter Masala", "Chapati", "Steamed Rice"],
        ),
    ];

    for (offset, (breakfast, lunch, snacks, dinner)) in week_plan.iter().enumerate() {
        let date = today + Duration::days(offset as i64);
        let req = SetDayMenuRequest {
            breakfast: to_strings(breakfast),
            lunch: to_strings(lunch),
            snacks: to_strings(snacks),
            dinner: to_strings(dinner),
        };
        menu.set_day(&pool, date, today, &req)
            .await
            .with_context(|| format!("Failed to plan menu for {date}"))?;
    }

    // 5. Votes for today, through the real submission path
    println!("Recording today's votes...");
    let votes: &[(&str, &[&str], &[&str], &[&str], &[&str], &[&str])] = &[
        // student, breakfast, lunch, snacks, dinner, others
        ("H-2024-001", &["Idli"], &["Veg Biryani", "Chapati"], &["Samosa"], &["Paneer Butter Masala", "Jeera Rice"], &[]),
        ("H-2024-002", &["Upma"], &["Veg Biryani"], &[], &["Chapati"], &[]),
        ("H-2024-003", &["Idli"], &["Dal Tadka", "Chapati"], &["Masala Chai"], &["Jeera Rice"], &[]),
        ("H-2023-011", &[], &["Veg Biryani"], &["Samosa", "Masala Chai"], &["Paneer Butter Masala"], &[SKIP_BREAKFAST]),
        ("H-2023-012", &["Idli", "Upma"], &[], &[], &[], &[]),
        ("H-2022-021", &[], &[], &[], &[], &[OUT_ALL_DAY]),
    ];

    for (student_id, breakfast, lunch, snacks, dinner, others) in votes {
        let session = StudentSession {
            student_id: student_id.to_string(),
        };
        let req = SubmitVoteRequest {
            day: today,
            edit: false,
            selection: MealSelection {
                breakfast: to_strings(breakfast),
                lunch: to_strings(lunch),
                snacks: to_strings(snacks),
                dinner: to_strings(dinner),
                others: to_strings(others),
            },
        };
        VoteLedger::submit(&pool, &menu, &feed, &session, today, &req)
            .await
            .with_context(|| format!("Failed to record vote for {student_id}"))?;
    }

    // 6. Complaints for today
    println!("Filing a few complaints...");
    let complaints = [
        ("H-2024-002", Lunch,  "Veg Biryani", "The rice was undercooked today."),
        ("H-2023-012", Breakfast, "Idli",     "Served cold, and the sambar was watery."),
        ("H-2024-001", Snacks, "Samosa",      "Too oily, hard to eat more than one."),
    ];

    for (student_id, category, food_item, text) in &complaints {
        let session = StudentSession {
            student_id: student_id.to_string(),
        };
        let req = SubmitComplaintRequest {
            day: today,
            category: *category,
            food_item: food_item.to_string(),
            complaint: text.to_string(),
        };
        ComplaintLedger::submit(&pool, &menu, &feed, &session, &req)
            .await
            .with_context(|| format!("Failed to file complaint for {student_id}"))?;
    }

    println!(
        "Done: {} students, {} catalog items, 7 menu days, {} votes, {} complaints.",
        students.len(),
        catalog.len(),
        votes.len(),
        complaints.len()
    );
    Ok(())
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
