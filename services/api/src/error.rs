use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use shopdeploy_core::envelope::error_response;
use shopdeploy_domain::order::InvalidTransition;

/// Storefront API error variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("forbidden")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("cart item not found")]
    CartItemNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("category already exists")]
    CategoryAlreadyExists,
    #[error("insufficient stock for {product}")]
    InsufficientStock { product: String },
    #[error("cart is empty")]
    EmptyCart,
    #[error("order is already cancelled")]
    AlreadyCancelled,
    #[error("cannot cancel delivered order")]
    CannotCancelDelivered,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("payment provider error: {0}")]
    UpstreamPayment(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::CategoryAlreadyExists => "CATEGORY_ALREADY_EXISTS",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::EmptyCart => "EMPTY_CART",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::CannotCancelDelivered => "CANNOT_CANCEL_DELIVERED",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::UpstreamPayment(_) => "UPSTREAM_PAYMENT_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InsufficientStock { .. }
            | Self::EmptyCart
            | Self::AlreadyCancelled
            | Self::CannotCancelDelivered
            | Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UserNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists | Self::CategoryAlreadyExists => StatusCode::CONFLICT,
            Self::UpstreamPayment(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
            }
            Self::UpstreamPayment(reason) => {
                tracing::warn!(reason = %reason, kind = "UPSTREAM_PAYMENT_ERROR", "payment provider error");
            }
            _ => {}
        }
        error_response(self.status(), self.kind(), &self.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<serde_qs::Error> for ApiError {
    fn from(e: serde_qs::Error) -> Self {
        Self::Validation(format!("invalid query string: {e}"))
    }
}
