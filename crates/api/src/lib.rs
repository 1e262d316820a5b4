//! HTTP API server for the order system.
//!
//! Provides REST endpoints for member registration, the product catalog,
//! and order placement, with structured logging (tracing) and Prometheus
//! metrics. Identity arrives pre-validated from the upstream
//! authenticator and is threaded explicitly into the services.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use channel::{InMemoryStockChannel, StockChannel};
use domain::{
    InMemoryMemberRepository, InMemoryOrderRepository, InMemoryProductRepository,
    MemberRepository, ProductRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::{OrderingService, Reconciler};
use stock::{InMemoryStockCounters, StockCounters};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub members: Arc<dyn MemberRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub ordering: Arc<OrderingService>,
    pub counters: Arc<dyn StockCounters>,
    pub channel: Arc<dyn StockChannel>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/member/create", post(routes::members::create))
        .route("/member/list", get(routes::members::list))
        .route("/member/myinfo", get(routes::members::myinfo))
        .route("/member/delete", delete(routes::members::soft_delete))
        .route("/product/create", post(routes::products::create))
        .route("/product/list", get(routes::products::list))
        .route("/product/detail/{id}", get(routes::products::detail))
        .route("/product/update/{id}", put(routes::products::update))
        .route("/ordering/create", post(routes::ordering::create))
        .route("/ordering/list", get(routes::ordering::list))
        .route("/ordering/myorders", get(routes::ordering::my_orders))
        .route("/ordering/cancel/{id}", post(routes::ordering::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over in-memory backends, plus the
/// reconciliation worker bound to the same channel and product store.
///
/// The reconciler is returned unstarted; the caller spawns `run()`
/// exactly once. One worker per queue is a hard operational invariant.
pub fn create_default_state() -> (Arc<AppState>, Reconciler) {
    let members: Arc<dyn MemberRepository> = Arc::new(InMemoryMemberRepository::new());
    let products: Arc<dyn ProductRepository> = Arc::new(InMemoryProductRepository::new());
    let orders = Arc::new(InMemoryOrderRepository::new());
    let counters: Arc<dyn StockCounters> = Arc::new(InMemoryStockCounters::new());
    let channel: Arc<dyn StockChannel> = Arc::new(InMemoryStockChannel::new());

    let ordering = Arc::new(OrderingService::new(
        members.clone(),
        products.clone(),
        orders,
        counters.clone(),
        channel.clone(),
    ));
    let reconciler = Reconciler::new(products.clone(), channel.clone());

    let state = Arc::new(AppState {
        members,
        products,
        ordering,
        counters,
        channel,
    });

    (state, reconciler)
}
