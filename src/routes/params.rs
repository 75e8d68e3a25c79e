use serde::Deserialize;
use utoipa::ToSchema;

use crate::dto::orders::OrderView;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub customer_id: Option<i32>,
    pub status: Option<String>,
    #[serde(default)]
    pub view: OrderView,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ViewQuery {
    #[serde(default)]
    pub view: OrderView,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderItemQuery {
    pub order_id: Option<i32>,
    pub product_id: Option<i32>,
}
