//! Coupon preview.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::Price;

use crate::db::CouponRepository;
use crate::error::{ApiResult, AppError, ok};
use crate::extract::{ApiPath, ApiQuery};
use crate::services::pricing::{self, Quote};
use crate::state::AppState;

/// Query of `GET /api/coupons/{code}`.
#[derive(Debug, Deserialize)]
pub struct CouponQuery {
    pub subtotal: Price,
}

/// `GET /api/coupons/{code}?subtotal=`
#[instrument(skip(state))]
pub async fn preview(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
    ApiQuery(query): ApiQuery<CouponQuery>,
) -> ApiResult<Quote> {
    if query.subtotal.amount().is_sign_negative() {
        return Err(AppError::BadRequest("subtotal must not be negative".to_owned()));
    }

    let coupon = CouponRepository::new(state.pool())
        .get(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("coupon not found".to_owned()))?;

    ok(pricing::quote(&coupon, query.subtotal, chrono::Utc::now())?)
}
