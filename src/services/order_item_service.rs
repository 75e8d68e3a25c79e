use serde_json::Value;

use crate::{
    dto::order_items::{OrderItemList, deserialize_item_update, deserialize_order_item},
    error::{AppResult, OrderError, OrderResult},
    models::OrderItem,
    repository::{OrderStore, Repository},
    response::{ApiResponse, Meta},
    routes::params::OrderItemQuery,
    services::order_service::load_order,
    state::AppState,
};

pub async fn list_items(
    state: &AppState,
    order_id: i32,
    product_id: Option<i32>,
) -> AppResult<ApiResponse<OrderItemList>> {
    let store = state.store.as_ref();
    let order = load_order(store, order_id).await?;
    let items: Vec<OrderItem> = store
        .find_by_order_id(order.id)
        .await?
        .into_iter()
        .filter(|item| product_id.is_none_or(|product_id| item.product_id == product_id))
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Order items", OrderItemList { items }, Some(meta)))
}

/// Cross-order item query. Both filters combine; neither lists every item.
pub async fn search_items(
    state: &AppState,
    query: OrderItemQuery,
) -> AppResult<ApiResponse<OrderItemList>> {
    let store = state.store.as_ref();
    let items = match (query.order_id, query.product_id) {
        (Some(order_id), product_id) => store
            .find_by_order_id(order_id)
            .await?
            .into_iter()
            .filter(|item| product_id.is_none_or(|product_id| item.product_id == product_id))
            .collect(),
        (None, Some(product_id)) => store.find_by_product(product_id).await?,
        (None, None) => Repository::<OrderItem>::all(store).await?,
    };

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Order items", OrderItemList { items }, Some(meta)))
}

pub async fn create_item(
    state: &AppState,
    order_id: i32,
    raw: Value,
) -> AppResult<ApiResponse<OrderItem>> {
    let store = state.store.as_ref();
    let order = load_order(store, order_id).await?;
    let payload = deserialize_order_item(&raw)?;
    let item = Repository::<OrderItem>::create(store, payload.for_order(order.id)).await?;

    tracing::info!(order_id = order.id, item_id = item.id, "order item created");
    Ok(ApiResponse::success("Order item created", item, Some(Meta::empty())))
}

pub async fn get_item(
    state: &AppState,
    order_id: i32,
    item_id: i32,
) -> AppResult<ApiResponse<OrderItem>> {
    let item = load_item(state.store.as_ref(), order_id, item_id).await?;
    Ok(ApiResponse::success("Order item", item, Some(Meta::empty())))
}

/// `order_id` in the body is discarded; items never move between orders.
pub async fn update_item(
    state: &AppState,
    order_id: i32,
    item_id: i32,
    raw: Value,
) -> AppResult<ApiResponse<OrderItem>> {
    let store = state.store.as_ref();
    let item = load_item(store, order_id, item_id).await?;
    let payload = deserialize_item_update(raw)?;
    let item = Repository::<OrderItem>::update(store, &payload.apply_to(&item)).await?;
    Ok(ApiResponse::success("Order item updated", item, Some(Meta::empty())))
}

/// Deleting an item that is already gone succeeds.
pub async fn delete_item(state: &AppState, order_id: i32, item_id: i32) -> AppResult<()> {
    let store = state.store.as_ref();
    let Some(item) = Repository::<OrderItem>::find(store, item_id).await? else {
        tracing::debug!(order_id, item_id, "order item already deleted");
        return Ok(());
    };
    if item.order_id != order_id {
        return Err(OrderError::item_not_found(item_id).into());
    }
    Repository::<OrderItem>::delete(store, &item).await?;
    Ok(())
}

/// The item, provided it belongs to `order_id`.
async fn load_item(store: &dyn OrderStore, order_id: i32, item_id: i32) -> OrderResult<OrderItem> {
    Repository::<OrderItem>::find(store, item_id)
        .await?
        .filter(|item| item.order_id == order_id)
        .ok_or_else(|| OrderError::item_not_found(item_id))
}
