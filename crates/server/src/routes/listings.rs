//! Marketplace handlers: listings, shops and purchases.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::{ListingId, ListingStatus, TaskAction, UserId, WorkId};

use crate::db::listings::ListingPurchase;
use crate::db::{ListingRepository, WorkRepository};
use crate::error::{ApiResponse, ApiResult, AppError, Result, add_breadcrumb, ok};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireUser;
use crate::models::{Listing, ListingView};
use crate::services::{AuthUser, rules};
use crate::state::AppState;

use super::profile::ensure_profile;
use super::tasks::record_task;

/// Query of `GET /api/listings`.
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub seller: Option<UserId>,
}

/// Body of `POST /api/listings/create`.
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub work_id: WorkId,
    pub price: i64,
    pub title: Option<String>,
}

/// Body of `PUT /api/listings/featured`.
#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    pub listing_id: ListingId,
}

async fn owned_listing(state: &AppState, user: &AuthUser, id: ListingId) -> Result<Listing> {
    let listing = ListingRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("listing not found".to_owned()))?;
    rules::ensure_owner(listing.seller_id, user.id)?;
    Ok(listing)
}

/// `GET /api/listings`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> ApiResult<Vec<ListingView>> {
    ok(ListingRepository::new(state.pool()).list_active(query.seller).await?)
}

/// `GET /api/shops/{user_id}`
#[instrument(skip(state))]
pub async fn shop(State(state): State<AppState>, ApiPath(seller): ApiPath<UserId>) -> ApiResult<Vec<ListingView>> {
    ok(ListingRepository::new(state.pool()).shop(seller).await?)
}

/// `POST /api/listings/create`
///
/// The price is checked before anything is read from the store.
#[instrument(skip(state, user, body), fields(user_id = %user.id, work_id = %body.work_id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CreateListingRequest>,
) -> ApiResult<Listing> {
    let price = rules::listing_price(body.price)?;
    let title = body.title.as_deref().map(rules::title).transpose()?;

    let work = WorkRepository::new(state.pool())
        .get(body.work_id)
        .await?
        .ok_or_else(|| AppError::NotFound("work not found".to_owned()))?;
    rules::ensure_owner(work.user_id, user.id)?;
    ensure_profile(&state, &user).await?;

    let title = title.unwrap_or(work.title);
    let listing = ListingRepository::new(state.pool())
        .create(user.id, work.id, &title, price)
        .await?;
    record_task(&state, &user, TaskAction::CreateListing).await;
    Ok(ApiResponse::created(listing))
}

/// `POST /api/listings/{id}/withdraw`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn withdraw(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ListingId>,
) -> ApiResult<Listing> {
    let listing = owned_listing(&state, &user, id).await?;
    rules::listing_transition(listing.status, ListingStatus::Withdrawn)?;

    let listing = ListingRepository::new(state.pool()).withdraw(id).await?;
    tracing::info!(listing_id = %id, "Listing withdrawn");
    ok(listing)
}

/// `PUT /api/listings/featured`
#[instrument(skip(state, user, body), fields(user_id = %user.id, listing_id = %body.listing_id))]
pub async fn featured(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<FeatureRequest>,
) -> ApiResult<Listing> {
    owned_listing(&state, &user, body.listing_id).await?;
    ok(ListingRepository::new(state.pool())
        .set_featured(user.id, body.listing_id)
        .await?)
}

/// `POST /api/listings/{id}/buy`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn buy(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ListingId>,
) -> ApiResult<ListingPurchase> {
    ensure_profile(&state, &user).await?;
    let purchase = ListingRepository::new(state.pool()).buy(id, user.id).await?;
    let listing_id = id.to_string();
    add_breadcrumb("market", "Listing bought", Some(&[("listing_id", listing_id.as_str())]));
    ok(purchase)
}
