//! Item shop and inventory handlers.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::ItemId;

use crate::db::ItemRepository;
use crate::db::items::ItemPurchase;
use crate::error::{ApiResult, AppError, ok};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireUser;
use crate::models::{InventoryItem, Item};
use crate::services::rules;
use crate::state::AppState;

use super::profile::ensure_profile;

/// Body of `POST /api/items/purchase`.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub item_id: ItemId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// `GET /api/items`
#[instrument(skip(state))]
pub async fn catalog(State(state): State<AppState>) -> ApiResult<Vec<Item>> {
    ok(ItemRepository::new(state.pool()).catalog().await?)
}

/// `GET /api/items/inventory`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn inventory(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> ApiResult<Vec<InventoryItem>> {
    ok(ItemRepository::new(state.pool()).inventory(user.id).await?)
}

/// `POST /api/items/purchase`
#[instrument(skip(state, user, body), fields(user_id = %user.id, item_id = %body.item_id))]
pub async fn purchase(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<PurchaseRequest>,
) -> ApiResult<ItemPurchase> {
    let quantity = rules::cart_quantity(body.quantity)?;
    ensure_profile(&state, &user).await?;

    let items = ItemRepository::new(state.pool());
    let item = items
        .get(body.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("item not found".to_owned()))?;
    ok(items.purchase(user.id, &item, quantity).await?)
}

/// `POST /api/items/{id}/use`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn use_item(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ItemId>,
) -> ApiResult<InventoryItem> {
    let items = ItemRepository::new(state.pool());
    let item = items
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("item not found".to_owned()))?;
    if !item.consumable {
        return Err(AppError::BadRequest(format!("{} cannot be used up", item.name)));
    }
    ok(items.consume(user.id, id).await?)
}

/// `POST /api/items/{id}/toggle`
///
/// Equipping an item unequips whatever was equipped in the same slot.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ItemId>,
) -> ApiResult<InventoryItem> {
    ok(ItemRepository::new(state.pool()).toggle_equipped(user.id, id).await?)
}
