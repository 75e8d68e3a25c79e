use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    dto::fields::{as_object, optional_int, required_int},
    error::OrderResult,
    models::{NewLineItem, NewOrderItem, OrderItem},
};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemPayload {
    pub order_id: Option<i32>,
    pub product_id: i32,
    pub quantity: i32,
}

impl OrderItemPayload {
    /// The parent resolved by the caller takes precedence over any body value.
    pub fn for_order(&self, order_id: i32) -> NewOrderItem {
        if self.order_id.is_some_and(|body_id| body_id != order_id) {
            tracing::debug!(
                body_order_id = ?self.order_id,
                order_id,
                "ignoring order_id from item body"
            );
        }
        NewOrderItem {
            order_id,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }

    /// Updated copy of `item`; the parent order is never reassigned.
    pub fn apply_to(&self, item: &OrderItem) -> OrderItem {
        OrderItem {
            product_id: self.product_id,
            quantity: self.quantity,
            ..item.clone()
        }
    }
}

/// Checks `product_id` before `quantity`; `order_id` is optional here.
/// Any integer quantity is accepted.
pub fn deserialize_order_item(raw: &Value) -> OrderResult<OrderItemPayload> {
    let fields = as_object(raw, "OrderItem")?;
    let product_id = required_int(fields, "product_id")?;
    let quantity = required_int(fields, "quantity")?;
    let order_id = optional_int(fields, "order_id")?;
    Ok(OrderItemPayload {
        order_id,
        product_id,
        quantity,
    })
}

/// Update bodies lose `order_id` before validation.
pub fn deserialize_item_update(mut raw: Value) -> OrderResult<OrderItemPayload> {
    if let Some(fields) = raw.as_object_mut() {
        fields.remove("order_id");
    }
    deserialize_order_item(&raw)
}

pub(crate) fn deserialize_line_item(raw: &Value) -> OrderResult<NewLineItem> {
    let payload = deserialize_order_item(raw)?;
    Ok(NewLineItem {
        product_id: payload.product_id,
        quantity: payload.quantity,
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderItemList {
    #[schema(value_type = Vec<OrderItem>)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}
