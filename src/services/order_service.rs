use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;

use crate::{
    dto::orders::{
        OrderDetail, OrderList, OrderRepresentation, OrderView, deserialize_order,
        deserialize_order_update, order_detail, serialize_order,
    },
    error::{AppResult, OrderError, OrderResult},
    lifecycle,
    models::{Order, OrderItem, OrderStatus},
    repository::{OrderStore, Repository},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let store = state.store.as_ref();
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    let orders = match (query.customer_id, status) {
        (Some(customer_id), Some(status)) => {
            store.find_by_customer_and_status(customer_id, status).await?
        }
        (Some(customer_id), None) => store.find_by_customer(customer_id).await?,
        (None, Some(status)) => store.find_by_status(status).await?,
        (None, None) => Repository::<Order>::all(store).await?,
    };

    let mut lines_by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    if query.view == OrderView::Full {
        let ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
        for line in store.find_by_order_ids(&ids).await? {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }
    }

    let items: Vec<_> = orders
        .iter()
        .map(|order| {
            let lines = lines_by_order.remove(&order.id).unwrap_or_default();
            serialize_order(order, &lines, query.view)
        })
        .collect();

    tracing::info!(count = items.len(), "returning orders");
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn create_order(state: &AppState, raw: Value) -> AppResult<ApiResponse<OrderDetail>> {
    let (new, lines) = deserialize_order(&raw)?.into_new();
    let (order, items) = state.store.create_with_items(new, lines).await?;

    tracing::info!(order_id = order.id, "order created");
    Ok(ApiResponse::success(
        "Order created",
        order_detail(&order, &items),
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    id: i32,
    view: OrderView,
) -> AppResult<ApiResponse<OrderRepresentation>> {
    let store = state.store.as_ref();
    let order = load_order(store, id).await?;
    let items = match view {
        OrderView::Full => store.find_by_order_id(order.id).await?,
        OrderView::Basic => Vec::new(),
    };
    Ok(ApiResponse::success(
        "Order",
        serialize_order(&order, &items, view),
        Some(Meta::empty()),
    ))
}

/// Generic update of `customer_id` and `status`. Status changes here skip the
/// transition guards; nested `order_items` are ignored.
pub async fn update_order(
    state: &AppState,
    id: i32,
    raw: Value,
) -> AppResult<ApiResponse<OrderDetail>> {
    let store = state.store.as_ref();
    let order = load_order(store, id).await?;
    let payload = deserialize_order_update(raw)?;
    let order = Repository::<Order>::update(store, &payload.apply_to(&order, Utc::now())).await?;
    detail_response(store, "Order updated", order).await
}

pub async fn delete_order(state: &AppState, id: i32) -> AppResult<()> {
    let store = state.store.as_ref();
    let order = load_order(store, id).await?;
    Repository::<Order>::delete(store, &order).await?;
    Ok(())
}

pub async fn cancel_order(state: &AppState, id: i32) -> AppResult<ApiResponse<OrderDetail>> {
    let store = state.store.as_ref();
    let order = load_order(store, id).await?;
    let canceled = lifecycle::cancel(&order)?;
    let order = Repository::<Order>::update(store, &canceled).await?;
    tracing::info!(order_id = order.id, "order canceled");
    detail_response(store, "Order canceled", order).await
}

pub async fn return_order(state: &AppState, id: i32) -> AppResult<ApiResponse<OrderDetail>> {
    let store = state.store.as_ref();
    let order = load_order(store, id).await?;
    let returned = lifecycle::return_order(&order)?;
    let order = Repository::<Order>::update(store, &returned).await?;
    tracing::info!(order_id = order.id, "order returned");
    detail_response(store, "Return accepted", order).await
}

pub(crate) async fn load_order(store: &dyn OrderStore, id: i32) -> OrderResult<Order> {
    Repository::<Order>::find(store, id)
        .await?
        .ok_or_else(|| OrderError::order_not_found(id))
}

async fn detail_response(
    store: &dyn OrderStore,
    message: &str,
    order: Order,
) -> AppResult<ApiResponse<OrderDetail>> {
    let items: Vec<OrderItem> = store.find_by_order_id(order.id).await?;
    Ok(ApiResponse::success(
        message,
        order_detail(&order, &items),
        Some(Meta::empty()),
    ))
}
