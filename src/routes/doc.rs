use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        order_items::{OrderItemList, OrderItemRequest},
        orders::{
            LineItemRequest, OrderDetail, OrderList, OrderRepresentation, OrderRequest,
            OrderSummary, OrderView,
        },
    },
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::{health, order_items, orders, params},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::index,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        orders::cancel_order,
        orders::return_order,
        order_items::list_items,
        order_items::search_items,
        order_items::create_item,
        order_items::get_item,
        order_items::update_item,
        order_items::delete_item
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderStatus,
            OrderDetail,
            OrderSummary,
            OrderRepresentation,
            OrderView,
            OrderList,
            OrderItemList,
            OrderRequest,
            LineItemRequest,
            OrderItemRequest,
            params::OrderListQuery,
            params::ViewQuery,
            params::OrderItemQuery,
            order_items::ProductFilter,
            health::HealthData,
            health::ServiceInfo,
            Meta,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderRepresentation>,
            ApiResponse<OrderList>,
            ApiResponse<OrderItem>,
            ApiResponse<OrderItemList>
        )
    ),
    tags(
        (name = "Health", description = "Health check and service info"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Order Items", description = "Order item endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
