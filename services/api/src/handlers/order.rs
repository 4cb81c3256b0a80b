use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdeploy_auth_types::identity::Identity;
use shopdeploy_core::envelope::Envelope;
use shopdeploy_domain::id::{OrderId, ProductId, UserId};
use shopdeploy_domain::order::{OrderStatus, PaymentMethod, PaymentStatus};
use shopdeploy_domain::pagination::{PageRequest, Pagination};
use shopdeploy_domain::pricing::PriceBreakdown;

use crate::domain::types::{Order, OrderItem, OrderOwner, OrderWithOwner, ShippingAddress, StatusEntry};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::require_admin;
use crate::state::AppState;
use crate::usecase::order::{
    ALL_ORDERS_DEFAULT_LIMIT, CancelOrderUseCase, CreateOrderInput, CreateOrderUseCase,
    GetOrderUseCase, ListAllOrdersUseCase, ListMyOrdersUseCase, MY_ORDERS_DEFAULT_LIMIT,
    UpdateOrderStatusInput, UpdateOrderStatusUseCase, VerifyPaymentUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub qty: u32,
    pub image: Option<String>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            title: item.title,
            price: item.price,
            qty: item.qty,
            image: item.image,
        }
    }
}

#[derive(Serialize)]
pub struct StatusEntryResponse {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
}

impl From<StatusEntry> for StatusEntryResponse {
    fn from(entry: StatusEntry) -> Self {
        Self {
            status: entry.status,
            note: entry.note,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    #[serde(flatten)]
    pub price: PriceBreakdown,
    pub status: OrderStatus,
    pub status_history: Vec<StatusEntryResponse>,
    #[serde(serialize_with = "shopdeploy_core::serde::opt_to_rfc3339_ms")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "shopdeploy_core::serde::opt_to_rfc3339_ms")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            items: o.items.into_iter().map(Into::into).collect(),
            shipping_address: o.shipping_address,
            payment_method: o.payment_method,
            payment_status: o.payment_status,
            payment_id: o.payment_id,
            price: o.price,
            status: o.status,
            status_history: o.status_history.into_iter().map(Into::into).collect(),
            delivered_at: o.delivered_at,
            cancelled_at: o.cancelled_at,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

/// Admin listing row: the order plus who placed it.
#[derive(Serialize)]
pub struct OwnedOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub user: Option<OrderOwner>,
}

impl From<OrderWithOwner> for OwnedOrderResponse {
    fn from(row: OrderWithOwner) -> Self {
        Self {
            order: row.order.into(),
            user: row.owner,
        }
    }
}

#[derive(Serialize)]
pub struct OrderListResponse<T> {
    pub orders: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Deserialize, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

// ── POST /orders ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    /// Present for online payment methods; the client completes payment with it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

pub async fn create_order(
    identity: Identity,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<Envelope<CreateOrderResponse>, ApiError> {
    let usecase = CreateOrderUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
        stock: state.stock_repo(),
        orders: state.order_repo(),
        payments: state.payments.clone(),
        currency: state.payment_currency.clone(),
    };
    let out = usecase
        .execute(
            identity.user_id,
            CreateOrderInput {
                shipping_address: body.shipping_address,
                payment_method: body.payment_method,
            },
        )
        .await?;
    Ok(Envelope::created(
        "Order created",
        CreateOrderResponse {
            order: out.order.into(),
            client_secret: out.client_secret,
        },
    ))
}

// ── GET /orders ──────────────────────────────────────────────────────────────

pub async fn list_my_orders(
    identity: Identity,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Envelope<OrderListResponse<OrderResponse>>, ApiError> {
    let usecase = ListMyOrdersUseCase {
        orders: state.order_repo(),
    };
    let page = PageRequest::new(query.page, query.limit, MY_ORDERS_DEFAULT_LIMIT);
    let (orders, pagination) = usecase.execute(identity.user_id, page).await?;
    Ok(Envelope::ok(
        "Orders fetched",
        OrderListResponse {
            orders: orders.into_iter().map(Into::into).collect(),
            pagination,
        },
    ))
}

// ── GET /orders/all ──────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct AllOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn list_all_orders(
    identity: Identity,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AllOrdersQuery>,
) -> Result<Envelope<OrderListResponse<OwnedOrderResponse>>, ApiError> {
    require_admin(&identity)?;
    let usecase = ListAllOrdersUseCase {
        orders: state.order_repo(),
    };
    let page = PageRequest::new(query.page, query.limit, ALL_ORDERS_DEFAULT_LIMIT);
    let (orders, pagination) = usecase.execute(query.status, page).await?;
    Ok(Envelope::ok(
        "Orders fetched",
        OrderListResponse {
            orders: orders.into_iter().map(Into::into).collect(),
            pagination,
        },
    ))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

pub async fn get_order(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<OrderResponse>, ApiError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(identity.user_id, identity.role, id).await?;
    Ok(Envelope::ok("Order fetched", order.into()))
}

// ── PUT /orders/{id}/cancel ──────────────────────────────────────────────────

pub async fn cancel_order(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<OrderResponse>, ApiError> {
    let usecase = CancelOrderUseCase {
        orders: state.order_repo(),
        stock: state.stock_repo(),
    };
    let order = usecase.execute(identity.user_id, id).await?;
    Ok(Envelope::ok("Order cancelled", order.into()))
}

// ── PUT /orders/{id}/status ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

pub async fn update_order_status(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<UpdateOrderStatusRequest>,
) -> Result<Envelope<OrderResponse>, ApiError> {
    require_admin(&identity)?;
    let usecase = UpdateOrderStatusUseCase {
        orders: state.order_repo(),
        stock: state.stock_repo(),
    };
    let order = usecase
        .execute(
            id,
            UpdateOrderStatusInput {
                status: body.status,
                note: body.note,
            },
        )
        .await?;
    Ok(Envelope::ok("Order status updated", order.into()))
}

// ── PUT /orders/{id}/pay ─────────────────────────────────────────────────────

pub async fn verify_payment(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Envelope<OrderResponse>, ApiError> {
    let usecase = VerifyPaymentUseCase {
        orders: state.order_repo(),
        payments: state.payments.clone(),
    };
    let order = usecase.execute(identity.user_id, id).await?;
    Ok(Envelope::ok("Payment verified", order.into()))
}
