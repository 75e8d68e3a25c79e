pub mod order_item_service;
pub mod order_service;
