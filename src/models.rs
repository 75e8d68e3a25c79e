use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::OrderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Placed,
    Shipped,
    Returned,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Placed,
        OrderStatus::Shipped,
        OrderStatus::Returned,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Returned => "returned",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// No transition is defined out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Returned | OrderStatus::Canceled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    /// Case-insensitive; the error keeps the caller's original spelling.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == lowered)
            .ok_or_else(|| OrderError::InvalidStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    pub customer_id: i32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

/// An order that has not been stored yet. The repository assigns `id`,
/// `created_at` and, for orders born `shipped`, `shipped_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: i32,
    pub status: OrderStatus,
}

impl NewOrder {
    pub fn placed(customer_id: i32) -> Self {
        Self {
            customer_id,
            status: OrderStatus::Placed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

/// A line of a nested create payload, before its parent order exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub product_id: i32,
    pub quantity: i32,
}

impl NewLineItem {
    pub fn for_order(&self, order_id: i32) -> NewOrderItem {
        NewOrderItem {
            order_id,
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_placed() {
        assert_eq!(OrderStatus::default(), OrderStatus::Placed);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("Canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Canceled);
        assert!(" shipped ".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn unknown_status_keeps_original_value() {
        let err = "Lost".parse::<OrderStatus>().unwrap_err();
        assert!(matches!(err, OrderError::InvalidStatus(ref v) if v == "Lost"));
    }

    #[test]
    fn only_returned_and_canceled_are_terminal() {
        assert!(!OrderStatus::Placed.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Returned.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
    }
}
