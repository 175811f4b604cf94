//! Cart handlers.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::{CartItemId, ProductId, UserId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{ApiResult, AppError, Result, ok};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::services::rules;
use crate::state::AppState;

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// Body of `PUT /api/cart/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

async fn cart_view(state: &AppState, user: UserId) -> Result<CartView> {
    let lines = CartRepository::new(state.pool()).lines(user).await?;
    Ok(CartView::new(lines))
}

/// 404 if the line is gone, 403 if it belongs to someone else.
async fn ensure_line_owner(state: &AppState, id: CartItemId, user: UserId) -> Result<()> {
    let owner = CartRepository::new(state.pool())
        .owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart item not found".to_owned()))?;
    rules::ensure_owner(owner, user)?;
    Ok(())
}

/// `GET /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<CartView> {
    ok(cart_view(&state, user.id).await?)
}

/// `POST /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> ApiResult<CartView> {
    let quantity = rules::cart_quantity(body.quantity)?;

    let product = ProductRepository::new(state.pool())
        .get_active(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    if !product.is_purchasable() {
        return Err(AppError::Conflict(format!("{} is out of stock", product.name)));
    }

    let total = CartRepository::new(state.pool())
        .add(user.id, product.id, quantity)
        .await?;
    tracing::info!(product_id = %product.id, quantity = total, "Cart line updated");

    ok(cart_view(&state, user.id).await?)
}

/// `PUT /api/cart/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateCartRequest>,
) -> ApiResult<CartView> {
    let quantity = rules::cart_quantity(body.quantity)?;
    ensure_line_owner(&state, id, user.id).await?;
    CartRepository::new(state.pool()).set_quantity(id, quantity).await?;
    ok(cart_view(&state, user.id).await?)
}

/// `DELETE /api/cart/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<CartItemId>,
) -> ApiResult<CartView> {
    ensure_line_owner(&state, id, user.id).await?;
    CartRepository::new(state.pool()).remove(id).await?;
    ok(cart_view(&state, user.id).await?)
}

/// `DELETE /api/cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<CartView> {
    let removed = CartRepository::new(state.pool()).clear(user.id).await?;
    tracing::info!(removed, "Cart cleared");
    ok(CartView::new(Vec::new()))
}
