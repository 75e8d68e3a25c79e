use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    dto::{
        fields::{as_object, present, required_int},
        order_items::deserialize_line_item,
    },
    error::{OrderError, OrderResult},
    lifecycle,
    models::{NewLineItem, NewOrder, Order, OrderItem, OrderStatus},
};

/// A validated order body. `status` is `None` when the caller left it out.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayload {
    pub customer_id: i32,
    pub status: Option<OrderStatus>,
    pub order_items: Vec<NewLineItem>,
}

impl OrderPayload {
    pub fn into_new(self) -> (NewOrder, Vec<NewLineItem>) {
        let order = NewOrder {
            customer_id: self.customer_id,
            status: self.status.unwrap_or_default(),
        };
        (order, self.order_items)
    }

    /// The updated copy of `order`. A missing status keeps the current one;
    /// a present one goes through [`lifecycle::overwrite_status`].
    pub fn apply_to(&self, order: &Order, now: DateTime<Utc>) -> Order {
        let updated = Order {
            customer_id: self.customer_id,
            ..order.clone()
        };
        match self.status {
            Some(status) => lifecycle::overwrite_status(&updated, status, now),
            None => updated,
        }
    }
}

/// Checks `customer_id`, then `status`, then any nested `order_items`.
pub fn deserialize_order(raw: &Value) -> OrderResult<OrderPayload> {
    let fields = as_object(raw, "Order")?;
    let customer_id = required_int(fields, "customer_id")?;

    let status = match present(fields, "status") {
        Some(Value::String(value)) => Some(value.parse::<OrderStatus>()?),
        Some(other) => return Err(OrderError::InvalidStatus(other.to_string())),
        None => None,
    };

    let order_items = match present(fields, "order_items") {
        Some(Value::Array(items)) => items
            .iter()
            .map(deserialize_line_item)
            .collect::<OrderResult<Vec<_>>>()?,
        Some(_) => {
            return Err(OrderError::MalformedPayload(
                "order_items must be an array".into(),
            ));
        }
        None => Vec::new(),
    };

    Ok(OrderPayload {
        customer_id,
        status,
        order_items,
    })
}

/// Update bodies lose `order_items` before validation; updates never touch items.
pub fn deserialize_order_update(mut raw: Value) -> OrderResult<OrderPayload> {
    if let Some(fields) = raw.as_object_mut() {
        fields.remove("order_items");
    }
    deserialize_order(&raw)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderView {
    #[default]
    Full,
    Basic,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: i32,
    pub customer_id: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub order_items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_id: i32,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum OrderRepresentation {
    Detail(OrderDetail),
    Summary(OrderSummary),
}

pub fn serialize_order(order: &Order, items: &[OrderItem], view: OrderView) -> OrderRepresentation {
    match view {
        OrderView::Full => OrderRepresentation::Detail(order_detail(order, items)),
        OrderView::Basic => OrderRepresentation::Summary(OrderSummary {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
        }),
    }
}

pub fn order_detail(order: &Order, items: &[OrderItem]) -> OrderDetail {
    OrderDetail {
        id: order.id,
        customer_id: order.customer_id,
        status: order.status,
        created_at: order.created_at,
        shipped_at: order.shipped_at,
        order_items: items.to_vec(),
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderDetail>)]
    pub items: Vec<OrderRepresentation>,
}

/// Documented shape of create and update bodies.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderRequest {
    pub customer_id: i32,
    pub status: Option<OrderStatus>,
    pub order_items: Option<Vec<LineItemRequest>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LineItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}
