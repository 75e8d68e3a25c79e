use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use ::order_service::{
    dto::orders::{OrderDetail, OrderRepresentation, OrderView},
    error::{AppError, OrderError, OrderResult},
    models::{NewLineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
    repository::{MemoryStore, OrderItemRepository, OrderRepository, Repository},
    routes::params::{OrderItemQuery, OrderListQuery},
    services::{order_item_service, order_service},
    state::AppState,
};
use serde_json::{Value, json};

fn setup() -> AppState {
    AppState::new(MemoryStore::new())
}

/// Memory store whose writes can be switched to fail.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn writable(&self) -> OrderResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrderError::Persistence("disk unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<Order> for FlakyStore {
    async fn create(&self, new: NewOrder) -> OrderResult<Order> {
        self.writable()?;
        Repository::<Order>::create(&self.inner, new).await
    }

    async fn update(&self, order: &Order) -> OrderResult<Order> {
        self.writable()?;
        Repository::<Order>::update(&self.inner, order).await
    }

    async fn delete(&self, order: &Order) -> OrderResult<()> {
        self.writable()?;
        Repository::<Order>::delete(&self.inner, order).await
    }

    async fn find(&self, id: i32) -> OrderResult<Option<Order>> {
        Repository::<Order>::find(&self.inner, id).await
    }

    async fn all(&self) -> OrderResult<Vec<Order>> {
        Repository::<Order>::all(&self.inner).await
    }
}

#[async_trait]
impl OrderRepository for FlakyStore {
    async fn find_by_customer(&self, customer_id: i32) -> OrderResult<Vec<Order>> {
        self.inner.find_by_customer(customer_id).await
    }

    async fn find_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>> {
        self.inner.find_by_status(status).await
    }

    async fn find_by_customer_and_status(
        &self,
        customer_id: i32,
        status: OrderStatus,
    ) -> OrderResult<Vec<Order>> {
        self.inner
            .find_by_customer_and_status(customer_id, status)
            .await
    }

    async fn create_with_items(
        &self,
        new: NewOrder,
        items: Vec<NewLineItem>,
    ) -> OrderResult<(Order, Vec<OrderItem>)> {
        self.writable()?;
        self.inner.create_with_items(new, items).await
    }
}

#[async_trait]
impl Repository<OrderItem> for FlakyStore {
    async fn create(&self, new: NewOrderItem) -> OrderResult<OrderItem> {
        self.writable()?;
        Repository::<OrderItem>::create(&self.inner, new).await
    }

    async fn update(&self, item: &OrderItem) -> OrderResult<OrderItem> {
        self.writable()?;
        Repository::<OrderItem>::update(&self.inner, item).await
    }

    async fn delete(&self, item: &OrderItem) -> OrderResult<()> {
        self.writable()?;
        Repository::<OrderItem>::delete(&self.inner, item).await
    }

    async fn find(&self, id: i32) -> OrderResult<Option<OrderItem>> {
        Repository::<OrderItem>::find(&self.inner, id).await
    }

    async fn all(&self) -> OrderResult<Vec<OrderItem>> {
        Repository::<OrderItem>::all(&self.inner).await
    }
}

#[async_trait]
impl OrderItemRepository for FlakyStore {
    async fn find_by_order_id(&self, order_id: i32) -> OrderResult<Vec<OrderItem>> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn find_by_product(&self, product_id: i32) -> OrderResult<Vec<OrderItem>> {
        self.inner.find_by_product(product_id).await
    }

    async fn find_by_order_ids(&self, order_ids: &[i32]) -> OrderResult<Vec<OrderItem>> {
        self.inner.find_by_order_ids(order_ids).await
    }
}

async fn create_order(state: &AppState, body: Value) -> anyhow::Result<OrderDetail> {
    let resp = order_service::create_order(state, body).await?;
    Ok(resp.data.expect("created order"))
}

async fn create_item(state: &AppState, order_id: i32, body: Value) -> anyhow::Result<OrderItem> {
    let resp = order_item_service::create_item(state, order_id, body).await?;
    Ok(resp.data.expect("created item"))
}

async fn fetch_detail(state: &AppState, id: i32) -> anyhow::Result<OrderDetail> {
    let resp = order_service::get_order(state, id, OrderView::Full).await?;
    match resp.data.expect("order") {
        OrderRepresentation::Detail(detail) => Ok(detail),
        OrderRepresentation::Summary(_) => anyhow::bail!("expected the full view"),
    }
}

fn list_query(customer_id: Option<i32>, status: Option<&str>) -> OrderListQuery {
    OrderListQuery {
        customer_id,
        status: status.map(str::to_string),
        view: OrderView::Full,
    }
}

// Create defaults the status to placed and leaves shipped_at empty.
#[tokio::test]
async fn new_order_is_placed_and_unshipped() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    assert_eq!(order.customer_id, 7);
    assert_eq!(order.status, OrderStatus::Placed);
    assert!(order.shipped_at.is_none());
    assert!(order.order_items.is_empty());
    Ok(())
}

// placed -> shipped (generic update) -> returned (guarded transition).
#[tokio::test]
async fn shipping_stamps_time_and_return_follows() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let before = Utc::now();
    let shipped = order_service::update_order(
        &state,
        order.id,
        json!({ "customer_id": 7, "status": "shipped" }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    let shipped_at = shipped.shipped_at.expect("shipped_at set");
    assert!(shipped_at >= before);
    assert_eq!(shipped.created_at, order.created_at);

    let returned = order_service::return_order(&state, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(returned.status, OrderStatus::Returned);
    assert_eq!(returned.shipped_at, Some(shipped_at));
    Ok(())
}

#[tokio::test]
async fn returning_a_placed_order_is_rejected() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let err = order_service::return_order(&state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Order(OrderError::IllegalTransition {
            current: OrderStatus::Placed,
            required: OrderStatus::Shipped,
        })
    ));

    assert_eq!(fetch_detail(&state, order.id).await?.status, OrderStatus::Placed);
    Ok(())
}

#[tokio::test]
async fn cancel_only_from_placed() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let canceled = order_service::cancel_order(&state, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);

    let err = order_service::cancel_order(&state, order.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Order(OrderError::IllegalTransition {
            current: OrderStatus::Canceled,
            required: OrderStatus::Placed,
        })
    ));

    let shipped = create_order(&state, json!({ "customer_id": 7, "status": "shipped" })).await?;
    assert!(shipped.shipped_at.is_some());
    assert!(order_service::cancel_order(&state, shipped.id).await.is_err());
    assert_eq!(fetch_detail(&state, shipped.id).await?.status, OrderStatus::Shipped);
    Ok(())
}

#[tokio::test]
async fn transitions_on_missing_orders_are_not_found() {
    let state = setup();
    for result in [
        order_service::cancel_order(&state, 41).await,
        order_service::return_order(&state, 41).await,
    ] {
        assert!(matches!(
            result.unwrap_err(),
            AppError::Order(OrderError::NotFound { entity: "Order", id: 41 })
        ));
    }
}

// Deleting an order takes its items with it.
#[tokio::test]
async fn deleting_an_order_cascades_to_items() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;
    let item = create_item(
        &state,
        order.id,
        json!({ "order_id": order.id, "product_id": 10, "quantity": 2 }),
    )
    .await?;
    assert_eq!(item.order_id, order.id);

    order_service::delete_order(&state, order.id).await?;

    assert!(matches!(
        order_service::get_order(&state, order.id, OrderView::Full).await,
        Err(AppError::Order(OrderError::NotFound { .. }))
    ));
    let remaining = order_item_service::search_items(
        &state,
        OrderItemQuery {
            order_id: Some(order.id),
            product_id: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(remaining.items.is_empty());
    let everything = order_item_service::search_items(&state, OrderItemQuery::default())
        .await?
        .data
        .unwrap();
    assert!(everything.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn item_without_product_id_is_rejected() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let err = order_item_service::create_item(&state, order.id, json!({ "quantity": 2 }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Order(OrderError::MissingField(ref field)) if field == "product_id"
    ));
    Ok(())
}

#[tokio::test]
async fn customer_filter_returns_both_orders_in_order() -> anyhow::Result<()> {
    let state = setup();
    let first = create_order(&state, json!({ "customer_id": 7 })).await?;
    create_order(&state, json!({ "customer_id": 8 })).await?;
    let second = create_order(&state, json!({ "customer_id": 7 })).await?;

    let list = order_service::list_orders(&state, list_query(Some(7), None))
        .await?
        .data
        .unwrap();
    let ids: Vec<i32> = list.items.iter().map(OrderRepresentation::id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    Ok(())
}

#[tokio::test]
async fn status_filters_combine_with_customer() -> anyhow::Result<()> {
    let state = setup();
    let placed = create_order(&state, json!({ "customer_id": 7 })).await?;
    let shipped = create_order(&state, json!({ "customer_id": 7, "status": "Shipped" })).await?;
    let other = create_order(&state, json!({ "customer_id": 9, "status": "shipped" })).await?;

    let by_status = order_service::list_orders(&state, list_query(None, Some("shipped")))
        .await?
        .data
        .unwrap();
    let by_status: Vec<i32> = by_status.items.iter().map(OrderRepresentation::id).collect();
    assert_eq!(by_status, vec![shipped.id, other.id]);

    let both = order_service::list_orders(&state, list_query(Some(7), Some("placed")))
        .await?
        .data
        .unwrap();
    let both: Vec<i32> = both.items.iter().map(OrderRepresentation::id).collect();
    assert_eq!(both, vec![placed.id]);

    let none = order_service::list_orders(&state, list_query(Some(100), Some("returned")))
        .await?
        .data
        .unwrap();
    assert!(none.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_status_filter_is_a_client_error() {
    let state = setup();
    let err = order_service::list_orders(&state, list_query(None, Some("lost")))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Order(OrderError::InvalidStatus(ref s)) if s == "lost"));
}

#[tokio::test]
async fn invalid_status_update_leaves_order_untouched() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let err = order_service::update_order(
        &state,
        order.id,
        json!({ "customer_id": 8, "status": "teleported" }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Order(OrderError::InvalidStatus(_))));

    let stored = fetch_detail(&state, order.id).await?;
    assert_eq!(stored.customer_id, 7);
    assert_eq!(stored.status, OrderStatus::Placed);
    Ok(())
}

#[tokio::test]
async fn update_ignores_nested_items_entirely() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    let updated = order_service::update_order(
        &state,
        order.id,
        json!({ "customer_id": 9, "order_items": [{ "quantity": "many" }] }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.customer_id, 9);
    assert!(updated.order_items.is_empty());

    let updated = order_service::update_order(
        &state,
        order.id,
        json!({ "customer_id": 9, "order_items": "not a list" }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.status, OrderStatus::Placed);
    Ok(())
}

#[tokio::test]
async fn full_listing_attaches_each_orders_own_items() -> anyhow::Result<()> {
    let state = setup();
    let first = create_order(
        &state,
        json!({ "customer_id": 7, "order_items": [
            { "product_id": 10, "quantity": 1 },
            { "product_id": 11, "quantity": 2 }
        ] }),
    )
    .await?;
    let second = create_order(&state, json!({ "customer_id": 7 })).await?;
    create_item(&state, second.id, json!({ "product_id": 12, "quantity": 3 })).await?;
    create_item(&state, first.id, json!({ "product_id": 13, "quantity": 4 })).await?;

    let list = order_service::list_orders(&state, list_query(Some(7), None))
        .await?
        .data
        .unwrap();
    let products: Vec<(i32, Vec<i32>)> = list
        .items
        .iter()
        .map(|representation| match representation {
            OrderRepresentation::Detail(detail) => (
                detail.id,
                detail.order_items.iter().map(|item| item.product_id).collect(),
            ),
            OrderRepresentation::Summary(summary) => (summary.id, Vec::new()),
        })
        .collect();
    assert_eq!(
        products,
        vec![(first.id, vec![10, 11, 13]), (second.id, vec![12])]
    );
    Ok(())
}

#[tokio::test]
async fn nested_items_are_created_with_the_order() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(
        &state,
        json!({
            "customer_id": 7,
            "status": "placed",
            "order_items": [
                { "id": 500, "product_id": 10, "quantity": 2 },
                { "product_id": 11, "quantity": 1 }
            ]
        }),
    )
    .await?;

    assert_eq!(order.order_items.len(), 2);
    assert!(order.order_items.iter().all(|item| item.order_id == order.id));
    assert_ne!(order.order_items[0].id, 500);

    let listed = order_item_service::list_items(&state, order.id, Some(11))
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].product_id, 11);
    Ok(())
}

#[tokio::test]
async fn items_are_scoped_to_their_order() -> anyhow::Result<()> {
    let state = setup();
    let first = create_order(&state, json!({ "customer_id": 7 })).await?;
    let second = create_order(&state, json!({ "customer_id": 7 })).await?;
    let item = create_item(&state, first.id, json!({ "product_id": 10, "quantity": 2 })).await?;

    assert!(matches!(
        order_item_service::get_item(&state, second.id, item.id).await,
        Err(AppError::Order(OrderError::NotFound { entity: "OrderItem", .. }))
    ));
    assert!(matches!(
        order_item_service::delete_item(&state, second.id, item.id).await,
        Err(AppError::Order(OrderError::NotFound { .. }))
    ));

    let fetched = order_item_service::get_item(&state, first.id, item.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched, item);
    Ok(())
}

#[tokio::test]
async fn item_update_cannot_move_the_item() -> anyhow::Result<()> {
    let state = setup();
    let first = create_order(&state, json!({ "customer_id": 7 })).await?;
    let second = create_order(&state, json!({ "customer_id": 7 })).await?;
    let item = create_item(&state, first.id, json!({ "product_id": 10, "quantity": 2 })).await?;

    let updated = order_item_service::update_item(
        &state,
        first.id,
        item.id,
        json!({ "order_id": second.id, "product_id": 12, "quantity": 0 }),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.order_id, first.id);
    assert_eq!(updated.product_id, 12);
    assert_eq!(updated.quantity, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_item_succeeds() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;
    let item = create_item(&state, order.id, json!({ "product_id": 10, "quantity": 2 })).await?;

    order_item_service::delete_item(&state, order.id, item.id).await?;
    order_item_service::delete_item(&state, order.id, item.id).await?;
    order_item_service::delete_item(&state, order.id, 9_999).await?;
    Ok(())
}

#[tokio::test]
async fn items_need_an_existing_order() {
    let state = setup();
    let err = order_item_service::create_item(&state, 77, json!({ "product_id": 1, "quantity": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Order(OrderError::NotFound { entity: "Order", id: 77 })
    ));
}

#[tokio::test]
async fn storage_failures_surface_and_change_nothing() -> anyhow::Result<()> {
    let store = FlakyStore::default();
    let state = AppState::new(store.clone());
    let order = create_order(&state, json!({ "customer_id": 7 })).await?;

    store.fail_writes(true);
    let err = order_service::cancel_order(&state, order.id).await.unwrap_err();
    assert!(matches!(err, AppError::Order(OrderError::Persistence(_))));
    assert!(order_service::create_order(&state, json!({ "customer_id": 8 })).await.is_err());
    assert!(order_service::delete_order(&state, order.id).await.is_err());
    store.fail_writes(false);

    assert_eq!(fetch_detail(&state, order.id).await?.status, OrderStatus::Placed);
    let all = order_service::list_orders(&state, list_query(None, None))
        .await?
        .data
        .unwrap();
    assert_eq!(all.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn basic_view_omits_items_and_timestamps() -> anyhow::Result<()> {
    let state = setup();
    let order = create_order(
        &state,
        json!({ "customer_id": 7, "order_items": [{ "product_id": 1, "quantity": 1 }] }),
    )
    .await?;

    let resp = order_service::get_order(&state, order.id, OrderView::Basic).await?;
    let value = serde_json::to_value(resp.data.unwrap())?;
    assert_eq!(
        value,
        json!({ "id": order.id, "customer_id": 7, "status": "placed" })
    );
    Ok(())
}
