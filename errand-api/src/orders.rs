use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use errand_shared::{
    NewOrder, Order, OrderId, OrderPatch, OrderQuery, ReceiveRequest, DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::AuthUser, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub remark: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub remark: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentOrdersParams {
    pub search: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadAllResponse {
    pub acknowledged: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/current", get(current_orders))
        .route("/v1/orders/read", post(read_all_unread))
        .route(
            "/v1/orders/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        )
        .route("/v1/orders/{id}/receive", post(receive_order))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Publish an order as the authenticated user
pub async fn create_order(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let draft = NewOrder {
        creator_id: user_id,
        start_time: req.start_time,
        end_time: req.end_time,
        location: req.location,
        remark: req.remark,
        city: req.city,
    };
    let order = state.orders.create_order(draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders
/// Filtered, sorted, paginated listing
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.find_order_by_options(&query).await?))
}

/// GET /v1/orders/current
/// Orders still open for receiving
pub async fn current_orders(
    State(state): State<AppState>,
    Query(params): Query<CurrentOrdersParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .orders
        .find_current_orders(
            params.search.as_deref(),
            params.city.as_deref(),
            params.start,
            params.size,
        )
        .await?;
    Ok(Json(orders))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get_order(order_id).await?))
}

/// PATCH /v1/orders/{id}
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let patch = OrderPatch {
        id: order_id,
        start_time: req.start_time,
        end_time: req.end_time,
        location: req.location,
        remark: req.remark,
    };
    Ok(Json(state.orders.update_order(patch).await?))
}

/// POST /v1/orders/{id}/receive
/// Claim an order as the authenticated user
pub async fn receive_order(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .receive_order(ReceiveRequest {
            id: order_id,
            receiver_id: user_id,
        })
        .await?;
    Ok(Json(order))
}

/// DELETE /v1/orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, AppError> {
    state.orders.delete_order(user_id, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/orders/read
/// Acknowledge every received order the caller created
pub async fn read_all_unread(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ReadAllResponse>, AppError> {
    let acknowledged = state.orders.read_all_unread_orders(user_id).await?;
    Ok(Json(ReadAllResponse { acknowledged }))
}
