use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    dto::order_items::{OrderItemList, OrderItemRequest},
    error::AppResult,
    models::OrderItem,
    response::ApiResponse,
    routes::{created, params::OrderItemQuery},
    services::order_item_service,
    state::AppState,
};

/// `/api/order-items`: item queries across orders. Per-order item routes are
/// mounted by the orders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search_items))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub product_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/items",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("product_id" = Option<i32>, Query, description = "Only items of this product"),
    ),
    responses(
        (status = 200, description = "Items of the order", body = ApiResponse<OrderItemList>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Order Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderItemList>>> {
    let Path(order_id) = path?;
    let Query(filter) = filter?;
    let resp = order_item_service::list_items(&state, order_id, filter.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/order-items",
    params(
        ("order_id" = Option<i32>, Query, description = "Only items of this order"),
        ("product_id" = Option<i32>, Query, description = "Only items of this product"),
    ),
    responses(
        (status = 200, description = "Matching items", body = ApiResponse<OrderItemList>),
    ),
    tag = "Order Items"
)]
pub async fn search_items(
    State(state): State<AppState>,
    query: Result<Query<OrderItemQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderItemList>>> {
    let Query(query) = query?;
    let resp = order_item_service::search_items(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = OrderItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<OrderItem>),
        (status = 400, description = "Invalid item"),
        (status = 404, description = "Order not found"),
        (status = 415, description = "Body is not JSON"),
    ),
    tag = "Order Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Path(order_id) = path?;
    let Json(raw) = payload?;
    let resp = order_item_service::create_item(&state, order_id, raw).await?;
    let location = resp
        .data
        .as_ref()
        .map(|item| format!("/api/orders/{}/items/{}", item.order_id, item.id))
        .unwrap_or_default();
    Ok(created(location, resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("item_id" = i32, Path, description = "Order item ID"),
    ),
    responses(
        (status = 200, description = "Get item", body = ApiResponse<OrderItem>),
        (status = 404, description = "Item not found under this order"),
    ),
    tag = "Order Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let Path((order_id, item_id)) = path?;
    let resp = order_item_service::get_item(&state, order_id, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("item_id" = i32, Path, description = "Order item ID"),
    ),
    request_body = OrderItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<OrderItem>),
        (status = 400, description = "Invalid item"),
        (status = 404, description = "Item not found under this order"),
        (status = 415, description = "Body is not JSON"),
    ),
    tag = "Order Items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let Path((order_id, item_id)) = path?;
    let Json(raw) = payload?;
    let resp = order_item_service::update_item(&state, order_id, item_id, raw).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}/items/{item_id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("item_id" = i32, Path, description = "Order item ID"),
    ),
    responses(
        (status = 204, description = "Item deleted or already gone"),
        (status = 404, description = "Item belongs to another order"),
    ),
    tag = "Order Items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path((order_id, item_id)) = path?;
    order_item_service::delete_item(&state, order_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
