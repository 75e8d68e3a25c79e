use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Response,
    routing::{get, put},
};
use serde_json::Value;

use crate::{
    dto::orders::{OrderDetail, OrderList, OrderRepresentation, OrderRequest},
    error::AppResult,
    response::ApiResponse,
    routes::{
        created,
        order_items,
        params::{OrderListQuery, ViewQuery},
    },
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/{id}/cancel", put(cancel_order))
        .route("/{id}/return", put(return_order))
        .route(
            "/{id}/items",
            get(order_items::list_items).post(order_items::create_item),
        )
        .route(
            "/{id}/items/{item_id}",
            get(order_items::get_item)
                .put(order_items::update_item)
                .delete(order_items::delete_item),
        )
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("customer_id" = Option<i32>, Query, description = "Only orders of this customer"),
        ("status" = Option<String>, Query, description = "placed, shipped, returned or canceled"),
        ("view" = Option<String>, Query, description = "full (default) or basic"),
    ),
    responses(
        (status = 200, description = "List orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status filter"),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<OrderListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let Query(query) = query?;
    tracing::info!(?query, "request for order list");
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid order"),
        (status = 415, description = "Body is not JSON"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Json(raw) = payload?;
    let resp = order_service::create_order(&state, raw).await?;
    let location = resp
        .data
        .as_ref()
        .map(|order| format!("/api/orders/{}", order.id))
        .unwrap_or_default();
    Ok(created(location, resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
        ("view" = Option<String>, Query, description = "full (default) or basic"),
    ),
    responses(
        (status = 200, description = "Get order", body = ApiResponse<OrderRepresentation>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderRepresentation>>> {
    let Path(id) = path?;
    let Query(query) = query?;
    let resp = order_service::get_order(&state, id, query.view).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order ID")),
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Invalid order"),
        (status = 404, description = "Order not found"),
        (status = 415, description = "Body is not JSON"),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let Path(id) = path?;
    let Json(raw) = payload?;
    let resp = order_service::update_order(&state, id, raw).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order and its items deleted"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    order_service::delete_order(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/cancel",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order canceled", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Order is not placed"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let Path(id) = path?;
    let resp = order_service::cancel_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/return",
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 202, description = "Return accepted", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Order is not shipped"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn return_order(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderDetail>>)> {
    let Path(id) = path?;
    let resp = order_service::return_order(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}
