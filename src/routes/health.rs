use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::response::{ApiResponse, Meta};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub orders: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service name, version and entry point", body = ApiResponse<ServiceInfo>),
    ),
    tag = "Health"
)]
pub async fn index() -> Json<ApiResponse<ServiceInfo>> {
    let data = ServiceInfo {
        name: "Order REST API Service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        orders: "/api/orders".to_string(),
    };

    Json(ApiResponse::success("Order service", data, Some(Meta::empty())))
}
