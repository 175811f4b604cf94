//! Product catalog handlers. Only active products are ever shown.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use aizome_core::ProductId;

use crate::db::products::{ProductFilter, ProductSort};
use crate::db::{FavoriteRepository, Page, ProductRepository};
use crate::error::{ApiResult, AppError, Result, ok};
use crate::extract::{ApiPath, ApiQuery};
use crate::middleware::OptionalUser;
use crate::models::{Product, ProductView};
use crate::services::AuthUser;
use crate::state::AppState;

/// Query of `GET /api/products`.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// One page of a list.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Attach display fields, plus favorite flags for a signed-in caller.
async fn views(state: &AppState, user: Option<&AuthUser>, products: Vec<Product>) -> Result<Vec<ProductView>> {
    let favorites = match user {
        Some(user) => {
            let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
            Some(
                FavoriteRepository::new(state.pool())
                    .favorited_among(user.id, &ids)
                    .await?,
            )
        }
        None => None,
    };

    Ok(products
        .into_iter()
        .map(|product| {
            let favorited = favorites.as_ref().map(|ids| ids.contains(&product.id));
            ProductView {
                favorited,
                ..ProductView::from(product)
            }
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// `GET /api/products`
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Paginated<ProductView>> {
    let page = Page::new(query.page, query.per_page);
    let filter = ProductFilter {
        category: non_empty(query.category),
        query: non_empty(query.q),
        sort: query.sort,
    };

    let (products, total) = ProductRepository::new(state.pool()).list(&filter, page).await?;
    let items = views(&state, user.as_ref(), products).await?;

    ok(Paginated {
        items,
        page: page.offset / page.limit + 1,
        per_page: page.limit,
        total,
    })
}

/// `GET /api/products/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    ok(ProductRepository::new(state.pool()).categories().await?)
}

/// `GET /api/products/{id}`
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ApiPath(id): ApiPath<ProductId>,
) -> ApiResult<ProductView> {
    let product = ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;

    let mut views = views(&state, user.as_ref(), vec![product]).await?;
    views
        .pop()
        .map_or_else(|| Err(AppError::NotFound("product not found".to_owned())), ok)
}
