use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{OrderError, OrderResult},
    lifecycle,
    models::{NewLineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
    repository::{OrderItemRepository, OrderRepository, Record, Repository},
};

struct Table<E> {
    rows: Vec<E>,
    last_id: i32,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            last_id: 0,
        }
    }
}

impl<E: Record> Table<E> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: i32) -> Option<&E> {
        self.rows.iter().find(|row| row.id() == id)
    }

    fn replace(&mut self, entity: &E) -> OrderResult<E> {
        let slot = self
            .rows
            .iter_mut()
            .find(|row| row.id() == entity.id())
            .ok_or_else(|| {
                OrderError::Persistence(format!("{} {} no longer exists", E::KIND, entity.id()))
            })?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    fn remove(&mut self, id: i32) {
        self.rows.retain(|row| row.id() != id);
    }

    fn matching(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        self.rows.iter().filter(|row| predicate(row)).cloned().collect()
    }
}

#[derive(Default)]
struct Tables {
    orders: Table<Order>,
    items: Table<OrderItem>,
}

impl Tables {
    fn insert_order(&mut self, new: NewOrder) -> Order {
        let created_at = Utc::now();
        let order = Order {
            id: self.orders.next_id(),
            customer_id: new.customer_id,
            status: new.status,
            created_at,
            shipped_at: lifecycle::shipped_at_for_new(new.status, created_at),
        };
        self.orders.rows.push(order.clone());
        order
    }

    fn insert_item(&mut self, new: NewOrderItem) -> OrderResult<OrderItem> {
        if self.orders.get(new.order_id).is_none() {
            return Err(OrderError::order_not_found(new.order_id));
        }
        let item = OrderItem {
            id: self.items.next_id(),
            order_id: new.order_id,
            product_id: new.product_id,
            quantity: new.quantity,
        };
        self.items.rows.push(item.clone());
        Ok(item)
    }
}

/// In-memory order store for tests and local runs.
///
/// All tables sit behind one lock, so every write is applied whole.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Order> for MemoryStore {
    async fn create(&self, new: NewOrder) -> OrderResult<Order> {
        let mut tables = self.tables.write().await;
        let order = tables.insert_order(new);
        tracing::info!(order_id = order.id, "created order");
        Ok(order)
    }

    async fn update(&self, order: &Order) -> OrderResult<Order> {
        self.tables.write().await.orders.replace(order)
    }

    async fn delete(&self, order: &Order) -> OrderResult<()> {
        let mut tables = self.tables.write().await;
        tables.items.rows.retain(|item| item.order_id != order.id);
        tables.orders.remove(order.id);
        tracing::info!(order_id = order.id, "deleted order");
        Ok(())
    }

    async fn find(&self, id: i32) -> OrderResult<Option<Order>> {
        Ok(self.tables.read().await.orders.get(id).cloned())
    }

    async fn all(&self) -> OrderResult<Vec<Order>> {
        Ok(self.tables.read().await.orders.rows.clone())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_by_customer(&self, customer_id: i32) -> OrderResult<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.matching(|order| order.customer_id == customer_id))
    }

    async fn find_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.matching(|order| order.status == status))
    }

    async fn find_by_customer_and_status(
        &self,
        customer_id: i32,
        status: OrderStatus,
    ) -> OrderResult<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .matching(|order| order.customer_id == customer_id && order.status == status))
    }

    async fn create_with_items(
        &self,
        new: NewOrder,
        items: Vec<NewLineItem>,
    ) -> OrderResult<(Order, Vec<OrderItem>)> {
        let mut tables = self.tables.write().await;
        let order = tables.insert_order(new);
        let items = items
            .iter()
            .map(|line| tables.insert_item(line.for_order(order.id)))
            .collect::<OrderResult<Vec<_>>>()?;
        tracing::info!(order_id = order.id, items = items.len(), "created order");
        Ok((order, items))
    }
}

#[async_trait]
impl Repository<OrderItem> for MemoryStore {
    async fn create(&self, new: NewOrderItem) -> OrderResult<OrderItem> {
        self.tables.write().await.insert_item(new)
    }

    async fn update(&self, item: &OrderItem) -> OrderResult<OrderItem> {
        self.tables.write().await.items.replace(item)
    }

    async fn delete(&self, item: &OrderItem) -> OrderResult<()> {
        self.tables.write().await.items.remove(item.id);
        Ok(())
    }

    async fn find(&self, id: i32) -> OrderResult<Option<OrderItem>> {
        Ok(self.tables.read().await.items.get(id).cloned())
    }

    async fn all(&self) -> OrderResult<Vec<OrderItem>> {
        Ok(self.tables.read().await.items.rows.clone())
    }
}

#[async_trait]
impl OrderItemRepository for MemoryStore {
    async fn find_by_order_id(&self, order_id: i32) -> OrderResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables.items.matching(|item| item.order_id == order_id))
    }

    async fn find_by_product(&self, product_id: i32) -> OrderResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables.items.matching(|item| item.product_id == product_id))
    }

    async fn find_by_order_ids(&self, order_ids: &[i32]) -> OrderResult<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables.items.matching(|item| order_ids.contains(&item.order_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(order_id: i32, product_id: i32) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id,
            quantity: 1,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_sequence() {
        let store = MemoryStore::new();
        let first = Repository::<Order>::create(&store, NewOrder::placed(7)).await.unwrap();
        let second = Repository::<Order>::create(&store, NewOrder::placed(7)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
    }

    #[tokio::test]
    async fn item_requires_existing_order() {
        let store = MemoryStore::new();
        let err = Repository::<OrderItem>::create(&store, item(42, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NotFound { entity: "Order", id: 42 }));
        assert!(Repository::<OrderItem>::all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_an_order_removes_only_its_items() {
        let store = MemoryStore::new();
        let keep = Repository::<Order>::create(&store, NewOrder::placed(1)).await.unwrap();
        let doomed = Repository::<Order>::create(&store, NewOrder::placed(2)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(keep.id, 10)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(doomed.id, 11)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(doomed.id, 12)).await.unwrap();

        Repository::<Order>::delete(&store, &doomed).await.unwrap();

        assert!(store.find_by_order_id(doomed.id).await.unwrap().is_empty());
        assert_eq!(store.find_by_order_id(keep.id).await.unwrap().len(), 1);
        assert!(Repository::<Order>::find(&store, doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_item_lookup_covers_only_requested_orders() {
        let store = MemoryStore::new();
        let first = Repository::<Order>::create(&store, NewOrder::placed(1)).await.unwrap();
        let second = Repository::<Order>::create(&store, NewOrder::placed(2)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(first.id, 10)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(second.id, 11)).await.unwrap();
        Repository::<OrderItem>::create(&store, item(first.id, 12)).await.unwrap();

        let items = store.find_by_order_ids(&[first.id]).await.unwrap();
        let products: Vec<i32> = items.iter().map(|line| line.product_id).collect();
        assert_eq!(products, vec![10, 12]);
        assert_eq!(store.find_by_order_ids(&[first.id, second.id]).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_an_error() {
        let store = MemoryStore::new();
        let order = Repository::<Order>::create(&store, NewOrder::placed(1)).await.unwrap();
        let line = Repository::<OrderItem>::create(&store, item(order.id, 10)).await.unwrap();
        Repository::<OrderItem>::delete(&store, &line).await.unwrap();
        Repository::<OrderItem>::delete(&store, &line).await.unwrap();
    }

    #[tokio::test]
    async fn updating_a_removed_order_fails() {
        let store = MemoryStore::new();
        let order = Repository::<Order>::create(&store, NewOrder::placed(1)).await.unwrap();
        Repository::<Order>::delete(&store, &order).await.unwrap();
        let err = Repository::<Order>::update(&store, &order).await.unwrap_err();
        assert!(matches!(err, OrderError::Persistence(_)));
    }
}
