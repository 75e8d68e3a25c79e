use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::OrderStatus,
    response::{ApiResponse, Meta},
};

/// Failures of the order domain: payload validation, lifecycle rules,
/// lookups and the backing store.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid payload: missing {0}")]
    MissingField(String),

    #[error("Invalid payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid status '{0}'")]
    InvalidStatus(String),

    #[error("Order is {current}, transition requires {required}")]
    IllegalTransition {
        current: OrderStatus,
        required: OrderStatus,
    },

    #[error("{entity} with id '{id}' was not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl OrderError {
    pub fn order_not_found(id: i32) -> Self {
        OrderError::NotFound { entity: "Order", id }
    }

    pub fn item_not_found(id: i32) -> Self {
        OrderError::NotFound {
            entity: "OrderItem",
            id,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OrderError::MissingField(_)
                | OrderError::MalformedPayload(_)
                | OrderError::InvalidStatus(_)
                | OrderError::IllegalTransition { .. }
        )
    }
}

impl From<sea_orm::DbErr> for OrderError {
    fn from(err: sea_orm::DbErr) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::UnsupportedMediaType(rejection.body_text())
            }
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Order(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Order(OrderError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Order(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string();
        let body = ApiResponse {
            message,
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
