//! Seed the catalog with demo data.
//!
//! Every insert skips rows that already exist, so seeding twice is safe.
//! Prices are bound as text and cast to `NUMERIC` in SQL.

use aizome_core::{CouponKind, ItemKind, TaskAction};
use clap::ValueEnum;
use sqlx::PgPool;

use super::CommandError;

/// A subset of the seed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeedSet {
    Products,
    Coupons,
    Courses,
    Items,
    Tasks,
}

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    price: &'static str,
    original_price: Option<&'static str>,
    stock: i32,
}

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Indigo Tenugui",
        description: "Cotton hand towel dyed in fermented indigo, itajime pattern.",
        category: "textiles",
        price: "18.00",
        original_price: None,
        stock: 120,
    },
    SeedProduct {
        name: "Shibori Silk Scarf",
        description: "Arashi pole-wrapped silk scarf, twelve dips.",
        category: "textiles",
        price: "64.00",
        original_price: Some("80.00"),
        stock: 25,
    },
    SeedProduct {
        name: "Sukumo Starter Kit",
        description: "Composted indigo leaf, lye and wheat bran for a first vat.",
        category: "supplies",
        price: "42.50",
        original_price: None,
        stock: 60,
    },
    SeedProduct {
        name: "Itajime Clamp Set",
        description: "Cypress boards and clamps for fold-and-clamp resist.",
        category: "tools",
        price: "29.00",
        original_price: Some("34.00"),
        stock: 40,
    },
    SeedProduct {
        name: "Aizome Noren",
        description: "Linen doorway curtain with a kumo spiderweb center.",
        category: "home",
        price: "120.00",
        original_price: None,
        stock: 8,
    },
];

/// `(code, kind, value, min_spend)`
const COUPONS: &[(&str, CouponKind, &str, &str)] = &[
    ("WELCOME10", CouponKind::Percent, "10", "0"),
    ("INDIGO5", CouponKind::Fixed, "5.00", "30.00"),
];

/// `(title, summary, instructor, level, price)`
const COURSES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Indigo Basics",
        "Build and keep a fermentation vat, then dye your first cloth.",
        "Haru Aoki",
        "beginner",
        "0",
    ),
    (
        "Shibori Patterns",
        "Itajime, kumo and arashi resists from first fold to final rinse.",
        "Rin Sato",
        "intermediate",
        "25.00",
    ),
    (
        "Deep Navy Layering",
        "Reach katsu-iro with controlled dips and oxidation.",
        "Haru Aoki",
        "advanced",
        "40.00",
    ),
];

/// `(name, description, kind, price, consumable)`
const ITEMS: &[(&str, &str, ItemKind, i64, bool)] = &[
    ("Fresh Sukumo", "Adds depth to the next work.", ItemKind::Dye, 40, true),
    ("Lime Powder", "Keeps the vat alkaline for one session.", ItemKind::Dye, 25, true),
    ("Cypress Boards", "Reusable boards for itajime.", ItemKind::Tool, 150, false),
    ("Bamboo Pole", "Reusable pole for arashi.", ItemKind::Tool, 180, false),
    ("Noren Frame", "Shows off your best work in the shop.", ItemKind::Decoration, 300, false),
];

/// `(title, description, action, target_count, reward_coins)`
const TASKS: &[(&str, &str, TaskAction, i32, i64)] = &[
    ("First Dip", "Save your first work.", TaskAction::CraftWork, 1, 50),
    ("Busy Vat", "Save five works.", TaskAction::CraftWork, 5, 200),
    ("Open Shop", "List a work for sale.", TaskAction::CreateListing, 1, 80),
    ("Student", "Enroll in a course.", TaskAction::EnrollCourse, 1, 60),
    ("Patron", "Pay for an order.", TaskAction::PlaceOrder, 1, 100),
];

/// Seed every set, or only `only`.
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn run(pool: &PgPool, only: Option<SeedSet>) -> Result<(), CommandError> {
    let wanted = |set: SeedSet| only.is_none_or(|o| o == set);

    if wanted(SeedSet::Products) {
        products(pool).await?;
    }
    if wanted(SeedSet::Coupons) {
        coupons(pool).await?;
    }
    if wanted(SeedSet::Courses) {
        courses(pool).await?;
    }
    if wanted(SeedSet::Items) {
        items(pool).await?;
    }
    if wanted(SeedSet::Tasks) {
        tasks(pool).await?;
    }

    tracing::info!("Seeding complete!");
    Ok(())
}

async fn products(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0;
    for p in PRODUCTS {
        let result = sqlx::query(
            r"
            INSERT INTO products (name, description, category, price, original_price, stock)
            SELECT $1, $2, $3, $4::numeric, $5::numeric, $6
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(p.name)
        .bind(p.description)
        .bind(p.category)
        .bind(p.price)
        .bind(p.original_price)
        .bind(p.stock)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    tracing::info!(inserted, "Seeded products");
    Ok(())
}

async fn coupons(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0;
    for (code, kind, value, min_spend) in COUPONS {
        let result = sqlx::query(
            r"
            INSERT INTO coupons (code, kind, value, min_spend)
            VALUES ($1, $2, $3::numeric, $4::numeric)
            ON CONFLICT (code) DO NOTHING
            ",
        )
        .bind(code)
        .bind(kind.as_str())
        .bind(value)
        .bind(min_spend)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    tracing::info!(inserted, "Seeded coupons");
    Ok(())
}

async fn courses(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0;
    for (title, summary, instructor, level, price) in COURSES {
        let result = sqlx::query(
            r"
            INSERT INTO courses (title, summary, instructor, level, price, status, published_at)
            SELECT $1, $2, $3, $4, $5::numeric, 'published', now()
            WHERE NOT EXISTS (SELECT 1 FROM courses WHERE title = $1)
            ",
        )
        .bind(title)
        .bind(summary)
        .bind(instructor)
        .bind(level)
        .bind(price)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    tracing::info!(inserted, "Seeded courses");
    Ok(())
}

async fn items(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0;
    for (name, description, kind, price, consumable) in ITEMS {
        let result = sqlx::query(
            r"
            INSERT INTO items (name, description, kind, price, consumable)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(description)
        .bind(kind.as_str())
        .bind(price)
        .bind(consumable)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    tracing::info!(inserted, "Seeded items");
    Ok(())
}

async fn tasks(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0;
    for (title, description, action, target, reward) in TASKS {
        let result = sqlx::query(
            r"
            INSERT INTO tasks (title, description, action, target_count, reward_coins)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (title) DO NOTHING
            ",
        )
        .bind(title)
        .bind(description)
        .bind(action.as_str())
        .bind(target)
        .bind(reward)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    tracing::info!(inserted, "Seeded tasks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_rows_respect_schema_checks() {
        assert!(PRODUCTS.iter().all(|p| p.stock >= 0 && !p.price.starts_with('-')));
        assert!(COUPONS.iter().all(|(code, ..)| code.chars().all(|c| c.is_ascii_alphanumeric())));
        assert!(ITEMS.iter().all(|(_, _, _, price, _)| *price >= 0));
        assert!(TASKS.iter().all(|(_, _, _, target, reward)| *target > 0 && *reward >= 0));
    }

    #[test]
    fn test_every_task_action_is_seeded() {
        for action in [
            TaskAction::CraftWork,
            TaskAction::CreateListing,
            TaskAction::EnrollCourse,
            TaskAction::PlaceOrder,
        ] {
            assert!(TASKS.iter().any(|(_, _, a, ..)| *a == action), "{action} has no task");
        }
    }
}
