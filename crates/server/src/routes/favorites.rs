//! Favorite product handlers.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use aizome_core::ProductId;

use crate::db::{FavoriteRepository, ProductRepository};
use crate::error::{ApiResult, AppError, ok};
use crate::extract::ApiPath;
use crate::middleware::RequireUser;
use crate::models::ProductView;
use crate::state::AppState;

/// Favorite flag after a change.
#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub product_id: ProductId,
    pub favorited: bool,
}

/// `GET /api/favorites`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Vec<ProductView>> {
    let products = FavoriteRepository::new(state.pool()).list(user.id).await?;
    ok(products
        .into_iter()
        .map(|product| ProductView {
            favorited: Some(true),
            ..ProductView::from(product)
        })
        .collect())
}

/// `POST /api/favorites/{product_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> ApiResult<FavoriteState> {
    ProductRepository::new(state.pool())
        .get_active(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;

    let favorited = FavoriteRepository::new(state.pool())
        .toggle(user.id, product_id)
        .await?;
    ok(FavoriteState {
        product_id,
        favorited,
    })
}

/// `DELETE /api/favorites/{product_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(product_id): ApiPath<ProductId>,
) -> ApiResult<FavoriteState> {
    let removed = FavoriteRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound("favorite not found".to_owned()));
    }
    ok(FavoriteState {
        product_id,
        favorited: false,
    })
}
