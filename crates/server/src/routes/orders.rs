//! Order handlers.
//!
//! An order is created from explicit lines or from the caller's cart. Prices
//! always come from the product rows, never from the request.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use aizome_core::{OrderId, OrderStatus, ProductId, TaskAction};

use crate::db::orders::{NewOrder, OrderLine};
use crate::db::{CartRepository, CouponRepository, OrderRepository};
use crate::error::{ApiResponse, ApiResult, AppError, Result, add_breadcrumb, ok};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireUser;
use crate::models::{Order, OrderDetail, ShippingAddress};
use crate::services::pricing::{self, Quote};
use crate::services::{AuthUser, ids, rules};
use crate::state::AppState;

use super::tasks::record_task;

/// Most distinct products per order.
const MAX_ORDER_LINES: usize = 50;

/// One requested line.
#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Body of `POST /api/orders`. Without `items` the whole cart is ordered.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Option<Vec<OrderLineRequest>>,
    pub coupon_code: Option<String>,
    pub shipping_address: ShippingAddress,
}

/// Query of `GET /api/orders`.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// Merge duplicate products and bound quantities.
fn merge_lines(requested: &[OrderLineRequest]) -> Result<Vec<OrderLine>> {
    let mut merged: Vec<OrderLine> = Vec::with_capacity(requested.len());
    for line in requested {
        rules::cart_quantity(line.quantity)?;
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = rules::cart_quantity(existing.quantity + line.quantity)?,
            None => merged.push(OrderLine {
                product_id: line.product_id,
                quantity: line.quantity,
            }),
        }
    }
    Ok(merged)
}

/// Load an order the caller owns.
async fn owned_order(state: &AppState, id: OrderId, user: &AuthUser) -> Result<Order> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_owned()))?;
    rules::ensure_owner(order.user_id, user.id)?;
    Ok(order)
}

/// `GET /api/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiQuery(query): ApiQuery<OrderQuery>,
) -> ApiResult<Vec<Order>> {
    ok(OrderRepository::new(state.pool())
        .list_for_user(user.id, query.status)
        .await?)
}

/// `POST /api/orders`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> ApiResult<OrderDetail> {
    let shipping = body.shipping_address.normalized()?;

    let (lines, from_cart) = match &body.items {
        Some(items) => (merge_lines(items)?, false),
        None => {
            let cart = CartRepository::new(state.pool()).lines(user.id).await?;
            let lines = cart
                .iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect();
            (lines, true)
        }
    };
    if lines.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_owned()));
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(AppError::BadRequest(format!(
            "an order may hold at most {MAX_ORDER_LINES} products"
        )));
    }

    let coupon = match body.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(
            CouponRepository::new(state.pool())
                .get(code)
                .await?
                .ok_or_else(|| AppError::NotFound("coupon not found".to_owned()))?,
        ),
        None => None,
    };

    let now = chrono::Utc::now();
    let order = NewOrder {
        user: user.id,
        order_no: ids::order_number(now),
        lines,
        shipping,
        from_cart,
    };

    let detail = OrderRepository::new(state.pool())
        .create(order, |subtotal| match &coupon {
            Some(coupon) => pricing::quote(coupon, subtotal, now).map_err(AppError::from),
            None => Ok::<Quote, AppError>(Quote::plain(subtotal)),
        })
        .await?;

    add_breadcrumb("order", "Order created", Some(&[("order_no", detail.order.order_no.as_str())]));
    Ok(ApiResponse::created(detail))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<OrderDetail> {
    let order = owned_order(&state, id, &user).await?;
    let items = OrderRepository::new(state.pool()).items(id).await?;
    ok(OrderDetail { order, items })
}

async fn transition(state: &AppState, user: &AuthUser, id: OrderId, to: OrderStatus) -> Result<Order> {
    let order = owned_order(state, id, user).await?;
    rules::order_transition(order.status, to)?;
    let updated = OrderRepository::new(state.pool())
        .transition(id, order.status, to)
        .await?;
    Ok(updated)
}

/// `POST /api/orders/{id}/pay`
///
/// Payment itself is outside this service; the order is simply marked paid.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn pay(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<Order> {
    let order = transition(&state, &user, id, OrderStatus::Paid).await?;
    record_task(&state, &user, TaskAction::PlaceOrder).await;
    ok(order)
}

/// `POST /api/orders/{id}/cancel`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<Order> {
    ok(transition(&state, &user, id, OrderStatus::Cancelled).await?)
}

/// `POST /api/orders/{id}/confirm`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<Order> {
    ok(transition(&state, &user, id, OrderStatus::Completed).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_lines_sums_duplicates() {
        let a = ProductId::generate();
        let b = ProductId::generate();
        let merged = merge_lines(&[
            OrderLineRequest { product_id: a, quantity: 2 },
            OrderLineRequest { product_id: b, quantity: 1 },
            OrderLineRequest { product_id: a, quantity: 3 },
        ])
        .unwrap_or_default();
        assert_eq!(merged.len(), 2);
        let a_line = merged.iter().find(|l| l.product_id == a).map(|l| l.quantity);
        assert_eq!(a_line, Some(5));
    }

    #[test]
    fn test_merge_lines_bounds_quantities() {
        let a = ProductId::generate();
        assert!(merge_lines(&[OrderLineRequest { product_id: a, quantity: 0 }]).is_err());
        assert!(
            merge_lines(&[
                OrderLineRequest { product_id: a, quantity: 60 },
                OrderLineRequest { product_id: a, quantity: 60 },
            ])
            .is_err()
        );
    }
}
