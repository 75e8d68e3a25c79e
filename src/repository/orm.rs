use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
    ActiveValue::{NotSet, Set, Unchanged},
};

use crate::{
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{OrderError, OrderResult},
    lifecycle,
    models::{NewLineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
    repository::{OrderItemRepository, OrderRepository, Repository},
};

/// Order store over a SeaORM connection (Postgres in production, SQLite in tests).
#[derive(Clone)]
pub struct OrmStore {
    conn: DatabaseConnection,
}

impl OrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    async fn orders_where(&self, condition: Condition) -> OrderResult<Vec<Order>> {
        Orders::find()
            .filter(condition)
            .order_by_asc(OrderCol::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect()
    }

    async fn items_where(&self, condition: Condition) -> OrderResult<Vec<OrderItem>> {
        let items = OrderItems::find()
            .filter(condition)
            .order_by_asc(OrderItemCol::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();
        Ok(items)
    }
}

/// Logs the failed write and turns it into `Persistence`. The open transaction,
/// if any, is rolled back when it is dropped on the early return.
fn rolled_back(operation: &'static str) -> impl FnOnce(DbErr) -> OrderError {
    move |err| {
        tracing::error!(error = %err, operation, "write failed, rolling back");
        OrderError::Persistence(err.to_string())
    }
}

async fn insert_order<C: ConnectionTrait>(conn: &C, new: &NewOrder) -> Result<OrderModel, DbErr> {
    let created_at = Utc::now();
    OrderActive {
        id: NotSet,
        customer_id: Set(new.customer_id),
        status: Set(new.status.as_str().to_string()),
        created_at: Set(created_at.into()),
        shipped_at: Set(lifecycle::shipped_at_for_new(new.status, created_at).map(Into::into)),
    }
    .insert(conn)
    .await
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    new: &NewOrderItem,
) -> Result<OrderItemModel, DbErr> {
    OrderItemActive {
        id: NotSet,
        order_id: Set(new.order_id),
        product_id: Set(new.product_id),
        quantity: Set(new.quantity),
    }
    .insert(conn)
    .await
}

#[async_trait]
impl Repository<Order> for OrmStore {
    async fn create(&self, new: NewOrder) -> OrderResult<Order> {
        tracing::info!(customer_id = new.customer_id, status = %new.status, "creating order");
        let model = insert_order(&self.conn, &new)
            .await
            .map_err(rolled_back("create order"))?;
        order_from_entity(model)
    }

    async fn update(&self, order: &Order) -> OrderResult<Order> {
        tracing::info!(order_id = order.id, status = %order.status, "saving order");
        let model = OrderActive {
            id: Unchanged(order.id),
            customer_id: Set(order.customer_id),
            status: Set(order.status.as_str().to_string()),
            created_at: NotSet,
            shipped_at: Set(order.shipped_at.map(Into::into)),
        }
        .update(&self.conn)
        .await
        .map_err(rolled_back("update order"))?;
        order_from_entity(model)
    }

    async fn delete(&self, order: &Order) -> OrderResult<()> {
        const OP: &str = "delete order";
        let txn = self.conn.begin().await.map_err(rolled_back(OP))?;
        let items = OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .exec(&txn)
            .await
            .map_err(rolled_back(OP))?;
        Orders::delete_by_id(order.id)
            .exec(&txn)
            .await
            .map_err(rolled_back(OP))?;
        txn.commit().await.map_err(rolled_back(OP))?;

        tracing::info!(order_id = order.id, items = items.rows_affected, "deleted order");
        Ok(())
    }

    async fn find(&self, id: i32) -> OrderResult<Option<Order>> {
        tracing::debug!(order_id = id, "looking up order");
        Orders::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(order_from_entity)
            .transpose()
    }

    async fn all(&self) -> OrderResult<Vec<Order>> {
        self.orders_where(Condition::all()).await
    }
}

#[async_trait]
impl OrderRepository for OrmStore {
    async fn find_by_customer(&self, customer_id: i32) -> OrderResult<Vec<Order>> {
        tracing::debug!(customer_id, "querying orders by customer");
        self.orders_where(Condition::all().add(OrderCol::CustomerId.eq(customer_id)))
            .await
    }

    async fn find_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>> {
        tracing::debug!(%status, "querying orders by status");
        self.orders_where(Condition::all().add(OrderCol::Status.eq(status.as_str())))
            .await
    }

    async fn find_by_customer_and_status(
        &self,
        customer_id: i32,
        status: OrderStatus,
    ) -> OrderResult<Vec<Order>> {
        tracing::debug!(customer_id, %status, "querying orders by customer and status");
        self.orders_where(
            Condition::all()
                .add(OrderCol::CustomerId.eq(customer_id))
                .add(OrderCol::Status.eq(status.as_str())),
        )
        .await
    }

    async fn create_with_items(
        &self,
        new: NewOrder,
        lines: Vec<NewLineItem>,
    ) -> OrderResult<(Order, Vec<OrderItem>)> {
        const OP: &str = "create order";
        tracing::info!(customer_id = new.customer_id, items = lines.len(), "creating order");
        let txn = self.conn.begin().await.map_err(rolled_back(OP))?;

        let order = insert_order(&txn, &new).await.map_err(rolled_back(OP))?;
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = insert_item(&txn, &line.for_order(order.id))
                .await
                .map_err(rolled_back(OP))?;
            items.push(order_item_from_entity(item));
        }

        txn.commit().await.map_err(rolled_back(OP))?;
        Ok((order_from_entity(order)?, items))
    }
}

#[async_trait]
impl Repository<OrderItem> for OrmStore {
    async fn create(&self, new: NewOrderItem) -> OrderResult<OrderItem> {
        const OP: &str = "create order item";
        tracing::info!(order_id = new.order_id, product_id = new.product_id, "creating order item");
        let txn = self.conn.begin().await.map_err(rolled_back(OP))?;

        let parent = Orders::find_by_id(new.order_id)
            .one(&txn)
            .await
            .map_err(rolled_back(OP))?;
        if parent.is_none() {
            return Err(OrderError::order_not_found(new.order_id));
        }

        let item = insert_item(&txn, &new).await.map_err(rolled_back(OP))?;
        txn.commit().await.map_err(rolled_back(OP))?;
        Ok(order_item_from_entity(item))
    }

    async fn update(&self, item: &OrderItem) -> OrderResult<OrderItem> {
        tracing::info!(item_id = item.id, "saving order item");
        let model = OrderItemActive {
            id: Unchanged(item.id),
            order_id: Unchanged(item.order_id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
        }
        .update(&self.conn)
        .await
        .map_err(rolled_back("update order item"))?;
        Ok(order_item_from_entity(model))
    }

    async fn delete(&self, item: &OrderItem) -> OrderResult<()> {
        let result = OrderItems::delete_by_id(item.id)
            .exec(&self.conn)
            .await
            .map_err(rolled_back("delete order item"))?;
        tracing::info!(item_id = item.id, removed = result.rows_affected, "deleted order item");
        Ok(())
    }

    async fn find(&self, id: i32) -> OrderResult<Option<OrderItem>> {
        tracing::debug!(item_id = id, "looking up order item");
        let item = OrderItems::find_by_id(id).one(&self.conn).await?;
        Ok(item.map(order_item_from_entity))
    }

    async fn all(&self) -> OrderResult<Vec<OrderItem>> {
        self.items_where(Condition::all()).await
    }
}

#[async_trait]
impl OrderItemRepository for OrmStore {
    async fn find_by_order_id(&self, order_id: i32) -> OrderResult<Vec<OrderItem>> {
        tracing::debug!(order_id, "querying order items by order");
        self.items_where(Condition::all().add(OrderItemCol::OrderId.eq(order_id)))
            .await
    }

    async fn find_by_product(&self, product_id: i32) -> OrderResult<Vec<OrderItem>> {
        tracing::debug!(product_id, "querying order items by product");
        self.items_where(Condition::all().add(OrderItemCol::ProductId.eq(product_id)))
            .await
    }

    async fn find_by_order_ids(&self, order_ids: &[i32]) -> OrderResult<Vec<OrderItem>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(orders = order_ids.len(), "querying order items for orders");
        self.items_where(
            Condition::all().add(OrderItemCol::OrderId.is_in(order_ids.iter().copied())),
        )
        .await
    }
}

fn order_from_entity(model: OrderModel) -> OrderResult<Order> {
    let status = model.status.parse::<OrderStatus>().map_err(|_| {
        OrderError::Persistence(format!(
            "order {} has unknown stored status '{}'",
            model.id, model.status
        ))
    })?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
    }
}
