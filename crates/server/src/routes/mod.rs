//! JSON API route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Database readiness
//!
//! # Auth (rate limited)
//! POST /api/auth/register           - Sign up and create profile
//! POST /api/auth/login              - Sign in, store tokens in session
//! POST /api/auth/logout             - Clear session
//! GET  /api/auth/me                 - Current user
//!
//! # Store
//! GET  /api/products                - Active products (?category&q&sort&page&per_page)
//! GET  /api/products/categories     - Distinct categories
//! GET  /api/products/{id}           - Product detail
//! GET|POST|DELETE /api/cart         - Cart lines, add, clear
//! PUT|DELETE /api/cart/{id}         - Set quantity, remove line
//! GET  /api/coupons/{code}          - Discount preview (?subtotal)
//! GET|POST /api/orders              - My orders, create order
//! GET  /api/orders/{id}             - Order detail
//! POST /api/orders/{id}/pay|cancel|confirm
//! GET  /api/favorites               - Favorite products
//! POST|DELETE /api/favorites/{product_id}
//!
//! # Courses
//! GET  /api/courses                 - Published courses (?level&q)
//! GET  /api/courses/enrolled        - My enrollments
//! GET  /api/courses/{id}            - Course detail
//! POST /api/courses/{id}/enroll     - Enroll (idempotent)
//! PUT  /api/courses/{id}/progress   - Update progress
//! GET|POST /api/courses/{id}/comments
//! DELETE /api/comments/{id}         - Author only
//!
//! # Profile
//! GET|PUT /api/profile
//! GET  /api/wallet                  - Coins and recent transactions
//!
//! # Game and market
//! POST /api/game/score              - Score preview
//! GET|POST /api/game/works          - My works, save a work
//! GET|DELETE /api/game/works/{id}
//! GET  /api/game/leaderboard
//! GET  /api/items                   - Item catalog
//! GET  /api/items/inventory
//! POST /api/items/purchase
//! POST /api/items/{id}/use|toggle
//! GET  /api/listings                - Active listings (?seller)
//! GET  /api/shops/{user_id}         - A seller's shop
//! POST /api/listings/create
//! POST /api/listings/{id}/withdraw|buy
//! PUT  /api/listings/featured
//! GET  /api/tasks
//! POST /api/tasks/{id}/claim
//!
//! # Files
//! POST /api/upload                  - Multipart image upload
//! GET  /api/files                   - My files (?prefix)
//! GET|DELETE /api/files/{*path}
//! ```
//!
//! Economy writes (orders, purchases, listings, task claims) share a
//! relaxed per-IP rate limit.

pub mod auth;
pub mod cart;
pub mod coupons;
pub mod courses;
pub mod favorites;
pub mod files;
pub mod game;
pub mod health;
pub mod items;
pub mod listings;
pub mod orders;
pub mod products;
pub mod profile;
pub mod tasks;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::middleware::{auth_rate_limiter, economy_rate_limiter};
use crate::services::storage::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Headroom for multipart boundaries and the `folder` field.
const UPLOAD_BODY_OVERHEAD: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route_layer(auth_rate_limiter())
}

/// Create the store routes router (products, cart, coupons, orders, favorites).
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/categories", get(products::categories))
        .route("/products/{id}", get(products::show))
        .route("/cart", get(cart::show).post(cart::add).delete(cart::clear))
        .route("/cart/{id}", put(cart::update).delete(cart::remove))
        .route("/coupons/{code}", get(coupons::preview))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/orders/{id}/confirm", post(orders::confirm))
        .route("/favorites", get(favorites::index))
        .route(
            "/favorites/{product_id}",
            post(favorites::toggle).delete(favorites::remove),
        )
}

/// Create the course routes router.
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(courses::index))
        .route("/courses/enrolled", get(courses::enrolled))
        .route("/courses/{id}", get(courses::show))
        .route("/courses/{id}/enroll", post(courses::enroll))
        .route("/courses/{id}/progress", put(courses::progress))
        .route(
            "/courses/{id}/comments",
            get(courses::comments).post(courses::add_comment),
        )
        .route("/comments/{id}", delete(courses::delete_comment))
}

/// Create the profile, game and marketplace read routes router.
pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::show).put(profile::update))
        .route("/wallet", get(profile::wallet))
        .route("/game/score", post(game::score))
        .route("/game/works", get(game::works).post(game::create_work))
        .route("/game/works/{id}", get(game::work).delete(game::delete_work))
        .route("/game/leaderboard", get(game::leaderboard))
        .route("/items", get(items::catalog))
        .route("/items/inventory", get(items::inventory))
        .route("/items/{id}/use", post(items::use_item))
        .route("/items/{id}/toggle", post(items::toggle))
        .route("/listings", get(listings::index))
        .route("/listings/{id}/withdraw", post(listings::withdraw))
        .route("/shops/{user_id}", get(listings::shop))
        .route("/tasks", get(tasks::index))
}

/// Create the rate limited routes that move coins, stock or ownership.
pub fn economy_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::create))
        .route("/orders/{id}/pay", post(orders::pay))
        .route("/items/purchase", post(items::purchase))
        .route("/listings/create", post(listings::create))
        .route("/listings/featured", put(listings::featured))
        .route("/listings/{id}/buy", post(listings::buy))
        .route("/tasks/{id}/claim", post(tasks::claim))
        .route_layer(economy_rate_limiter())
}

/// Create the file routes router.
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(files::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + UPLOAD_BODY_OVERHEAD)),
        )
        .route("/files", get(files::list))
        .route("/files/{*path}", get(files::read).delete(files::delete))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .merge(store_routes())
        .merge(course_routes())
        .merge(game_routes())
        .merge(economy_routes())
        .merge(file_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
