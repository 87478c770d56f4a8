use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    domain::cart::CartRuleError,
    response::{ApiResponse, Meta},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Item not found")]
    CartItemNotFound,

    #[error("Sorry, this product is out of stock.")]
    OutOfStock,

    #[error("Not enough stock available")]
    InsufficientStock,

    #[error("Invalid action")]
    InvalidAction,

    #[error("Invalid promo code")]
    InvalidPromo,

    #[error("Your cart is empty!")]
    EmptyCart,

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::CartItemNotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::InvalidAction
            | AppError::InvalidPromo
            | AppError::EmptyCart => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) | AppError::OutOfStock | AppError::InsufficientStock => {
                StatusCode::CONFLICT
            }
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Server-side failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            AppError::OrmError(_) | AppError::Internal(_) => {
                "An error occurred. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub(crate) fn log(&self) {
        match self {
            AppError::OrmError(err) => tracing::error!(error = %err, "database error"),
            AppError::Internal(err) => tracing::error!(error = ?err, "internal error"),
            _ => {}
        }
    }
}

impl From<CartRuleError> for AppError {
    fn from(err: CartRuleError) -> Self {
        match err {
            CartRuleError::OutOfStock => AppError::OutOfStock,
            CartRuleError::InsufficientStock => AppError::InsufficientStock,
            CartRuleError::ItemNotFound => AppError::CartItemNotFound,
            CartRuleError::UnknownAction => AppError::InvalidAction,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status();
        let fields = match &self {
            AppError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };

        let body = ApiResponse {
            message: self.public_message(),
            data: Some(ErrorData {
                error: self.public_message(),
                fields,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
