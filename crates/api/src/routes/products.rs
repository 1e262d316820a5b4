//! Product catalog endpoints.
//!
//! Product registration is where the stock counter is seeded: the
//! authoritative record and the counter start from the same quantity.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{ProductId, Role};
use domain::{NewProduct, PageRequest, Product, ProductSearch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::Auth;
use crate::error::ApiError;

use super::CommonResponse;

#[derive(Deserialize)]
pub struct ProductCreateRequest {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
}

#[derive(Deserialize)]
pub struct ProductUpdateRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
}

#[derive(Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            category: product.category,
            price_cents: product.price_cents,
            stock_quantity: product.stock_quantity,
        }
    }
}

/// POST /product/create — register a product and seed its counter (admin only).
#[tracing::instrument(skip(state, auth, req), fields(name = %req.name))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Json(req): Json<ProductCreateRequest>,
) -> Result<(StatusCode, Json<CommonResponse<String>>), ApiError> {
    auth.require(Role::Admin)?;

    if req.stock_quantity < 0 {
        return Err(ApiError::BadRequest(format!(
            "negative stock quantity: {}",
            req.stock_quantity
        )));
    }

    let product = Product::register(NewProduct {
        name: req.name,
        category: req.category,
        price_cents: req.price_cents,
        stock_quantity: req.stock_quantity,
    });
    let product_id = product.id;
    let quantity = product.stock_quantity;

    state.products.insert(product).await?;
    state
        .counters
        .seed(product_id, quantity)
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(CommonResponse::new(
            product_id.to_string(),
            StatusCode::CREATED,
            "product registered",
        )),
    ))
}

/// GET /product/list — paged product search.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<CommonResponse<Vec<ProductResponse>>>, ApiError> {
    let page = PageRequest::new(query.page.unwrap_or(0), query.size.unwrap_or(20));
    let search = ProductSearch {
        name: query.name,
        category: query.category,
    };

    let products = state.products.search(search, page).await?;
    let responses: Vec<ProductResponse> =
        products.into_iter().map(ProductResponse::from).collect();

    Ok(Json(CommonResponse::new(
        responses,
        StatusCode::OK,
        "product list",
    )))
}

/// GET /product/detail/{id} — load one product.
#[tracing::instrument(skip(state))]
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CommonResponse<ProductResponse>>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let product = state
        .products
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;

    Ok(Json(CommonResponse::new(
        product.into(),
        StatusCode::OK,
        "product detail",
    )))
}

/// PUT /product/update/{id} — update a product (admin only).
///
/// A new stock quantity re-seeds the counter: overwrite, no history.
#[tracing::instrument(skip(state, auth, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    auth: Auth,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdateRequest>,
) -> Result<Json<CommonResponse<String>>, ApiError> {
    auth.require(Role::Admin)?;

    let product_id = parse_product_id(&id)?;
    let mut product = state
        .products
        .find_by_id(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(category) = req.category {
        product.category = category;
    }
    if let Some(price_cents) = req.price_cents {
        product.price_cents = price_cents;
    }

    let reseed = match req.stock_quantity {
        Some(quantity) if quantity < 0 => {
            return Err(ApiError::BadRequest(format!(
                "negative stock quantity: {quantity}"
            )));
        }
        Some(quantity) => {
            product.stock_quantity = quantity;
            Some(quantity)
        }
        None => None,
    };

    state.products.update(product).await?;
    if let Some(quantity) = reseed {
        state
            .counters
            .seed(product_id, quantity)
            .await
            .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    }

    Ok(Json(CommonResponse::new(
        product_id.to_string(),
        StatusCode::OK,
        "product updated",
    )))
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    Uuid::parse_str(id)
        .map(ProductId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("invalid ID format: {e}")))
}
