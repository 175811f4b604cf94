//! Store-backed tests against a real database.
//!
//! These tests require:
//! - A running `PostgreSQL` database named by `DATABASE_URL`
//!
//! Run with: cargo test -p aizome-integration-tests -- --ignored

use aizome_core::{ListingStatus, OrderStatus, ProductId, UserId, WorkId};
use aizome_integration_tests::{app_with_pool, body_json, live_pool, mint_token, request};
use aizome_server::db::orders::{NewOrder, OrderLine};
use aizome_server::db::{
    ItemRepository, ListingRepository, OrderRepository, RepositoryError, WalletRepository,
    WorkRepository,
};
use aizome_server::models::ShippingAddress;
use aizome_server::services::pricing::Quote;
use axum::body::Body;
use axum::http::StatusCode;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Unique suffix so concurrent tests never collide on names.
fn tag() -> String {
    Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

async fn profile(pool: &PgPool, coins: i64) -> UserId {
    let id = UserId::generate();
    sqlx::query("INSERT INTO profiles (id, username, coins) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(format!("t_{}", tag()))
        .bind(coins)
        .execute(pool)
        .await
        .expect("profile inserted");
    id
}

async fn work(pool: &PgPool, owner: UserId) -> WorkId {
    sqlx::query_scalar(
        r"
        INSERT INTO craft_works (user_id, title, layers, score, grade, suggested_price)
        VALUES ($1, 'Shibori test', '[]'::jsonb, 80, 'A', 120)
        RETURNING id
        ",
    )
    .bind(owner)
    .fetch_one(pool)
    .await
    .expect("work inserted")
}

async fn coins(pool: &PgPool, user: UserId) -> i64 {
    WalletRepository::new(pool)
        .wallet(user)
        .await
        .expect("wallet readable")
        .coins
}

async fn course(pool: &PgPool, title: &str, status: &str) -> Uuid {
    sqlx::query_scalar(
        r"
        INSERT INTO courses (title, status, published_at)
        VALUES ($1, $2, CASE WHEN $2 = 'published' THEN now() END)
        RETURNING id
        ",
    )
    .bind(title)
    .bind(status)
    .fetch_one(pool)
    .await
    .expect("course inserted")
}

// ============================================================================
// Courses
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_course_catalog_lists_only_published() {
    let pool = live_pool().await;
    let marker = format!("katazome-{}", tag());
    let published = course(&pool, &format!("{marker} published"), "published").await;
    let draft = course(&pool, &format!("{marker} draft"), "draft").await;
    let app = app_with_pool(pool);

    let response = app
        .clone()
        .oneshot(
            request("GET", &format!("/api/courses?q={marker}"))
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .expect("course list")
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert_eq!(ids, vec![published.to_string().as_str()]);

    let response = app
        .oneshot(
            request("GET", &format!("/api/courses/{draft}"))
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("router is infallible");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_only_the_author_deletes_a_comment() {
    let pool = live_pool().await;
    let author = UserId::generate();
    let stranger = UserId::generate();
    let course_id = course(&pool, &format!("aizome-{}", tag()), "published").await;
    let comment: Uuid = sqlx::query_scalar(
        "INSERT INTO course_comments (course_id, user_id, body) VALUES ($1, $2, 'Lovely gradient') RETURNING id",
    )
    .bind(course_id)
    .bind(author)
    .fetch_one(&pool)
    .await
    .expect("comment inserted");
    let app = app_with_pool(pool.clone());

    let delete_as = |user: UserId| {
        request("DELETE", &format!("/api/comments/{comment}"))
            .header(
                "authorization",
                format!("Bearer {}", mint_token(user.as_uuid(), 600)),
            )
            .body(Body::empty())
            .expect("valid request")
    };

    let response = app.clone().oneshot(delete_as(stranger)).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["success"], false);

    let response = app.oneshot(delete_as(author)).await.expect("router is infallible");
    assert_eq!(response.status(), StatusCode::OK);

    let left: i64 = sqlx::query_scalar("SELECT count(*) FROM course_comments WHERE id = $1")
        .bind(comment)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(left, 0);
}

// ============================================================================
// Listing market
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_featuring_a_listing_clears_the_previous_one() {
    let pool = live_pool().await;
    let seller = profile(&pool, 500).await;
    let listings = ListingRepository::new(&pool);

    let first = listings
        .create(seller, work(&pool, seller).await, "First", 100)
        .await
        .expect("first listed");
    let second = listings
        .create(seller, work(&pool, seller).await, "Second", 200)
        .await
        .expect("second listed");

    assert!(listings.set_featured(seller, first.id).await.expect("featured").featured);
    assert!(listings.set_featured(seller, second.id).await.expect("featured").featured);

    let first = listings.get(first.id).await.expect("readable").expect("exists");
    assert!(!first.featured);

    let shop = listings.shop(seller).await.expect("shop readable");
    assert_eq!(shop.first().map(|v| v.listing.id), Some(second.id));
    assert_eq!(shop.iter().filter(|v| v.listing.featured).count(), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_buying_a_listing_moves_coins_and_work() {
    let pool = live_pool().await;
    let seller = profile(&pool, 500).await;
    let buyer = profile(&pool, 500).await;
    let work_id = work(&pool, seller).await;
    let listings = ListingRepository::new(&pool);

    let listing = listings
        .create(seller, work_id, "Indigo scarf", 120)
        .await
        .expect("listed");

    assert!(matches!(
        listings.buy(listing.id, seller).await,
        Err(RepositoryError::Conflict(_))
    ));

    let purchase = listings.buy(listing.id, buyer).await.expect("bought");
    assert_eq!(purchase.coins, 380);
    assert_eq!(purchase.listing.status, ListingStatus::Sold);
    assert_eq!(purchase.listing.buyer_id, Some(buyer));
    assert_eq!(coins(&pool, buyer).await, 380);
    assert_eq!(coins(&pool, seller).await, 620);

    let owned = WorkRepository::new(&pool)
        .get(work_id)
        .await
        .expect("readable")
        .expect("exists");
    assert_eq!(owned.user_id, buyer);

    let ledger = WalletRepository::new(&pool).wallet(seller).await.expect("wallet");
    assert!(
        ledger
            .transactions
            .iter()
            .any(|t| t.amount == 120 && t.reference_id == Some(listing.id.as_uuid()))
    );

    assert!(matches!(
        listings.buy(listing.id, buyer).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_deleting_a_sold_work_keeps_the_listing_history() {
    let pool = live_pool().await;
    let seller = profile(&pool, 500).await;
    let buyer = profile(&pool, 500).await;
    let work_id = work(&pool, seller).await;
    let listings = ListingRepository::new(&pool);
    let works = WorkRepository::new(&pool);

    let listing = listings.create(seller, work_id, "Tenugui", 50).await.expect("listed");
    assert!(matches!(works.delete(work_id).await, Err(RepositoryError::Conflict(_))));

    listings.buy(listing.id, buyer).await.expect("bought");
    works.delete(work_id).await.expect("sold work can be deleted");

    let sold = listings.get(listing.id).await.expect("readable").expect("row kept");
    assert_eq!(sold.status, ListingStatus::Sold);
    assert_eq!(sold.work_id, None);
}

// ============================================================================
// Coins and stock
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_debits_never_overdraw() {
    let pool = live_pool().await;
    let seller = profile(&pool, 500).await;
    let buyer = profile(&pool, 50).await;
    let listings = ListingRepository::new(&pool);

    let listing = listings
        .create(seller, work(&pool, seller).await, "Noren", 100)
        .await
        .expect("listed");
    assert!(matches!(
        listings.buy(listing.id, buyer).await,
        Err(RepositoryError::Conflict(_))
    ));
    let still = listings.get(listing.id).await.expect("readable").expect("exists");
    assert_eq!(still.status, ListingStatus::Active);

    let item_id: Uuid = sqlx::query_scalar(
        "INSERT INTO items (name, kind, price) VALUES ($1, 'tool', 60) RETURNING id",
    )
    .bind(format!("Vat paddle {}", tag()))
    .fetch_one(&pool)
    .await
    .expect("item inserted");
    let items = ItemRepository::new(&pool);
    let item = items
        .get(item_id.into())
        .await
        .expect("readable")
        .expect("exists");
    assert!(matches!(
        items.purchase(buyer, &item, 1).await,
        Err(RepositoryError::Conflict(_))
    ));

    assert_eq!(coins(&pool, buyer).await, 50);
    assert_eq!(coins(&pool, seller).await, 500);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL at DATABASE_URL"]
async fn test_cancelling_an_order_restores_stock() {
    let pool = live_pool().await;
    let user = UserId::generate();
    let product: ProductId = sqlx::query_scalar(
        "INSERT INTO products (name, category, price, stock) VALUES ($1, 'fabric', 12.50::numeric, 5) RETURNING id",
    )
    .bind(format!("Indigo cotton {}", tag()))
    .fetch_one(&pool)
    .await
    .expect("product inserted");
    let stock = |pool: PgPool| async move {
        sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
            .bind(product)
            .fetch_one(&pool)
            .await
            .expect("stock readable")
    };

    let orders = OrderRepository::new(&pool);
    let detail = orders
        .create(
            NewOrder {
                user,
                order_no: format!("AZT{}", tag()),
                lines: vec![OrderLine {
                    product_id: product,
                    quantity: 2,
                }],
                shipping: ShippingAddress::default(),
                from_cart: false,
            },
            |subtotal| Ok::<_, RepositoryError>(Quote::plain(subtotal)),
        )
        .await
        .expect("order created");
    assert_eq!(stock(pool.clone()).await, 3);

    let cancelled = orders
        .transition(detail.order.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await
        .expect("cancelled");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock(pool.clone()).await, 5);

    assert!(matches!(
        orders
            .transition(detail.order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await,
        Err(RepositoryError::Conflict(_))
    ));
}
