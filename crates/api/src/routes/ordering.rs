//! Order placement and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId, Role};
use domain::{Order, OrderLine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::Auth;
use crate::error::ApiError;

use super::CommonResponse;

/// One requested line: a product and how many units.
#[derive(Deserialize)]
pub struct OrderCreateLine {
    pub product_id: Uuid,
    pub product_count: i64,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub member_id: String,
    pub status: String,
    pub lines: Vec<OrderLineResponse>,
    pub placed_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            member_id: order.member_id.to_string(),
            status: order.status.to_string(),
            lines: order
                .lines
                .into_iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                })
                .collect(),
            placed_at: order.placed_at.to_rfc3339(),
        }
    }
}

/// POST /ordering/create — place an order for the authenticated member.
///
/// The body is the ordered line list; reservation happens in that order.
#[tracing::instrument(skip(state, auth, lines))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(lines): Json<Vec<OrderCreateLine>>,
) -> Result<(StatusCode, Json<CommonResponse<String>>), ApiError> {
    let lines = lines
        .into_iter()
        .map(|line| {
            OrderLine::new(ProductId::from_uuid(line.product_id), line.product_count)
                .map_err(ApiError::from)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let order_id = state.ordering.place_order(&auth.0, lines).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommonResponse::new(
            order_id.to_string(),
            StatusCode::CREATED,
            "order placed",
        )),
    ))
}

/// GET /ordering/list — all committed orders (admin only).
#[tracing::instrument(skip(state, auth))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> Result<Json<CommonResponse<Vec<OrderResponse>>>, ApiError> {
    auth.require(Role::Admin)?;

    let orders = state.ordering.list_orders().await?;
    let responses: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

    Ok(Json(CommonResponse::new(
        responses,
        StatusCode::OK,
        "order list",
    )))
}

/// GET /ordering/myorders — the authenticated member's committed orders.
#[tracing::instrument(skip(state, auth))]
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> Result<Json<CommonResponse<Vec<OrderResponse>>>, ApiError> {
    let orders = state.ordering.orders_for_member(auth.0.member_id).await?;
    let responses: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();

    Ok(Json(CommonResponse::new(
        responses,
        StatusCode::OK,
        "my orders",
    )))
}

/// POST /ordering/cancel/{id} — cancel an order.
///
/// Members cancel their own orders; admins may cancel any.
#[tracing::instrument(skip(state, auth))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Path(id): Path<String>,
) -> Result<Json<CommonResponse<String>>, ApiError> {
    let order_id = Uuid::parse_str(&id)
        .map(OrderId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("invalid ID format: {e}")))?;

    let order = state.ordering.get_order(order_id).await?;
    if order.member_id != auth.0.member_id && !auth.0.has_role(Role::Admin) {
        return Err(ApiError::Forbidden("not the owner of this order".to_string()));
    }

    state.ordering.cancel_order(order_id).await?;

    Ok(Json(CommonResponse::new(
        order_id.to_string(),
        StatusCode::OK,
        "order canceled",
    )))
}
