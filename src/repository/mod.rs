//! Persistence of the order aggregate.
//!
//! [`Repository`] is the per-entity contract; [`OrderRepository`] and
//! [`OrderItemRepository`] add the filter queries. Handlers hold an
//! [`OrderStore`], which is both. Every write is one atomic unit: it either
//! commits completely or fails with [`OrderError::Persistence`] and leaves
//! nothing behind.
//!
//! Both entity repositories live on the same store, so calls through a store
//! name the entity explicitly: `Repository::<Order>::find(store, id)`.

use async_trait::async_trait;

use crate::{
    error::OrderResult,
    models::{NewLineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus},
};

mod memory;
mod orm;

pub use memory::MemoryStore;
pub use orm::OrmStore;

/// A stored record with a repository-assigned id.
pub trait Record: Clone + Send + Sync + 'static {
    /// Insert shape, without any repository-assigned field.
    type New: Send + 'static;

    const KIND: &'static str;

    fn id(&self) -> i32;
}

impl Record for Order {
    type New = NewOrder;
    const KIND: &'static str = "Order";

    fn id(&self) -> i32 {
        self.id
    }
}

impl Record for OrderItem {
    type New = NewOrderItem;
    const KIND: &'static str = "OrderItem";

    fn id(&self) -> i32 {
        self.id
    }
}

#[async_trait]
pub trait Repository<E: Record>: Send + Sync {
    /// Stores `new` under a fresh id and returns the stored record.
    async fn create(&self, new: E::New) -> OrderResult<E>;

    /// Writes the current state of an already stored record.
    async fn update(&self, entity: &E) -> OrderResult<E>;

    /// Removes the record. Removing one that is already gone succeeds.
    async fn delete(&self, entity: &E) -> OrderResult<()>;

    /// Absence is `Ok(None)`, never an error.
    async fn find(&self, id: i32) -> OrderResult<Option<E>>;

    /// Every record in insertion order.
    async fn all(&self) -> OrderResult<Vec<E>>;
}

#[async_trait]
pub trait OrderRepository: Repository<Order> {
    async fn find_by_customer(&self, customer_id: i32) -> OrderResult<Vec<Order>>;

    async fn find_by_status(&self, status: OrderStatus) -> OrderResult<Vec<Order>>;

    async fn find_by_customer_and_status(
        &self,
        customer_id: i32,
        status: OrderStatus,
    ) -> OrderResult<Vec<Order>>;

    /// Creates the order and its line items in one unit of work.
    async fn create_with_items(
        &self,
        new: NewOrder,
        items: Vec<NewLineItem>,
    ) -> OrderResult<(Order, Vec<OrderItem>)>;
}

#[async_trait]
pub trait OrderItemRepository: Repository<OrderItem> {
    async fn find_by_order_id(&self, order_id: i32) -> OrderResult<Vec<OrderItem>>;

    async fn find_by_product(&self, product_id: i32) -> OrderResult<Vec<OrderItem>>;

    /// Items of any of `order_ids`, in insertion order.
    async fn find_by_order_ids(&self, order_ids: &[i32]) -> OrderResult<Vec<OrderItem>>;
}

pub trait OrderStore: OrderRepository + OrderItemRepository {}

impl<T: OrderRepository + OrderItemRepository> OrderStore for T {}
