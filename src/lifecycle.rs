//! Order status transitions.
//!
//! ```text
//! placed ──► shipped ──► returned
//!    │
//!    └─────► canceled
//! ```
//!
//! `cancel` and `return_order` are the guarded operations. `overwrite_status`
//! is the administrative path used by generic updates and accepts any target.
//! Every function works on a copy so a rejected transition leaves the caller's
//! order untouched.

use chrono::{DateTime, Utc};

use crate::{
    error::{OrderError, OrderResult},
    models::{Order, OrderStatus},
};

/// Whether the state machine defines `from -> to`.
pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Placed, OrderStatus::Shipped)
            | (OrderStatus::Placed, OrderStatus::Canceled)
            | (OrderStatus::Shipped, OrderStatus::Returned)
    )
}

pub fn cancel(order: &Order) -> OrderResult<Order> {
    guarded(order, OrderStatus::Placed, OrderStatus::Canceled)
}

pub fn return_order(order: &Order) -> OrderResult<Order> {
    guarded(order, OrderStatus::Shipped, OrderStatus::Returned)
}

fn guarded(order: &Order, required: OrderStatus, target: OrderStatus) -> OrderResult<Order> {
    if order.status != required {
        return Err(OrderError::IllegalTransition {
            current: order.status,
            required,
        });
    }
    Ok(Order {
        status: target,
        ..order.clone()
    })
}

/// Unguarded status write. Entering `shipped` stamps `shipped_at` the first
/// time only; leaving `shipped` never clears it.
pub fn overwrite_status(order: &Order, status: OrderStatus, now: DateTime<Utc>) -> Order {
    if order.status != status && !is_legal(order.status, status) {
        tracing::warn!(
            order_id = order.id,
            from = %order.status,
            to = %status,
            "status overwritten outside the state machine"
        );
    }

    let shipped_at = match (order.shipped_at, status) {
        (None, OrderStatus::Shipped) if order.status != OrderStatus::Shipped => Some(now),
        (existing, _) => existing,
    };

    Order {
        status,
        shipped_at,
        ..order.clone()
    }
}

/// `shipped_at` for an order that is created directly in `status`.
pub fn shipped_at_for_new(status: OrderStatus, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (status == OrderStatus::Shipped).then_some(now)
}
