use chrono::Utc;
use rust_decimal::Decimal;

use shopdeploy_domain::id::{OrderId, UserId};
use shopdeploy_domain::order::{OrderStatus, PaymentMethod, PaymentStatus};
use shopdeploy_domain::pagination::{PageRequest, Pagination};
use shopdeploy_domain::pricing::{PriceBreakdown, line_total};
use shopdeploy_domain::user::UserRole;

use crate::domain::repository::{
    CartRepository, OrderRepository, PaymentGateway, ProductRepository, StockRepository,
};
use crate::domain::types::{
    Order, OrderItem, OrderStatusChange, OrderWithOwner, PaymentIntent, PaymentIntentRequest,
    ShippingAddress, StatusEntry,
};
use crate::error::ApiError;
use crate::usecase::stock::{compensate, reserve_stock, restore_stock};

pub const USER_CANCEL_NOTE: &str = "Cancelled by user";
pub const PAYMENT_FAILED_NOTE: &str = "Payment intent creation failed";

pub const MY_ORDERS_DEFAULT_LIMIT: u64 = 10;
pub const ALL_ORDERS_DEFAULT_LIMIT: u64 = 20;

// ── CreateOrder ──────────────────────────────────────────────────────────────

pub struct CreateOrderInput {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug)]
pub struct CreateOrderOutput {
    pub order: Order,
    /// Present for online payments; the client confirms the payment with it.
    pub client_secret: Option<String>,
}

/// Checkout: turn the user's cart into an order.
///
/// Validate every line against current stock, reserve stock (compensated on
/// failure), persist the order, attach a payment intent for online methods,
/// then empty the cart. The cart is left untouched on any failure.
pub struct CreateOrderUseCase<C, P, S, O, G>
where
    C: CartRepository,
    P: ProductRepository,
    S: StockRepository,
    O: OrderRepository,
    G: PaymentGateway,
{
    pub carts: C,
    pub products: P,
    pub stock: S,
    pub orders: O,
    pub payments: G,
    pub currency: String,
}

impl<C, P, S, O, G> CreateOrderUseCase<C, P, S, O, G>
where
    C: CartRepository,
    P: ProductRepository,
    S: StockRepository,
    O: OrderRepository,
    G: PaymentGateway,
{
    pub async fn execute(
        &self,
        user_id: UserId,
        input: CreateOrderInput,
    ) -> Result<CreateOrderOutput, ApiError> {
        if let Some(field) = input.shipping_address.first_missing_field() {
            return Err(ApiError::validation(format!(
                "shippingAddress.{field} is required"
            )));
        }

        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(ApiError::EmptyCart)?;

        // Read-only pass: nothing is modified until every line checks out.
        let ids: Vec<_> = cart.items.iter().map(|item| item.product_id).collect();
        let products = self.products.find_by_ids(&ids).await?;
        let mut items = Vec::with_capacity(cart.items.len());
        let mut items_price = Decimal::ZERO;
        for line in &cart.items {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(ApiError::ProductNotFound)?;
            if product.stock < line.qty {
                return Err(ApiError::InsufficientStock {
                    product: product.title.clone(),
                });
            }
            items_price += line_total(product.price, line.qty);
            items.push(OrderItem {
                product_id: product.id,
                title: product.title.clone(),
                price: product.price,
                qty: line.qty,
                image: product.first_image_url().map(str::to_owned),
            });
        }

        reserve_stock(&self.stock, &items).await?;

        let now = Utc::now();
        let mut order = Order {
            id: OrderId::new(),
            user_id,
            items,
            shipping_address: input.shipping_address,
            payment_method: input.payment_method,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            price: PriceBreakdown::from_items_price(items_price),
            status: OrderStatus::Pending,
            status_history: vec![StatusEntry {
                status: OrderStatus::Pending,
                note: None,
                timestamp: now,
            }],
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.orders.create(&order).await {
            compensate(&self.stock, &order.stock_lines()).await;
            return Err(e);
        }

        let mut client_secret = None;
        if order.payment_method.requires_payment_intent() {
            match self.attach_payment_intent(&order).await {
                Ok(intent) => {
                    order.payment_id = Some(intent.id);
                    client_secret = intent.client_secret;
                }
                Err(e) => return Err(self.abandon(order, e).await),
            }
        }

        if let Err(e) = self.carts.clear(cart.id).await {
            // The order stands; a stale cart is recoverable, a duplicate order is not.
            tracing::error!(order_id = %order.id, cart_id = %cart.id, error = %e, "failed to clear cart after checkout");
        }

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.price.total_amount,
            payment_method = %order.payment_method,
            "order created"
        );

        Ok(CreateOrderOutput {
            order,
            client_secret,
        })
    }

    async fn attach_payment_intent(&self, order: &Order) -> Result<PaymentIntent, ApiError> {
        let intent = self
            .payments
            .create_payment_intent(&PaymentIntentRequest {
                order_id: order.id,
                amount: order.price.total_minor_units(),
                currency: self.currency.clone(),
            })
            .await?;
        self.orders.set_payment_id(order.id, &intent.id).await?;
        Ok(intent)
    }

    /// Undo a persisted order whose payment could not be set up.
    async fn abandon(&self, order: Order, cause: ApiError) -> ApiError {
        let mut change = OrderStatusChange::new(
            &order,
            OrderStatus::Cancelled,
            Some(PAYMENT_FAILED_NOTE.to_owned()),
            Utc::now(),
        );
        change.payment_status = PaymentStatus::Failed;
        match self.orders.apply_status_change(order.id, &change).await {
            Ok(true) => compensate(&self.stock, &order.stock_lines()).await,
            // Cancelled by someone else meanwhile, who already gave the stock back.
            Ok(false) => {
                tracing::warn!(order_id = %order.id, "order changed status before payment failure was recorded");
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "failed to cancel order after payment failure");
                compensate(&self.stock, &order.stock_lines()).await;
            }
        }
        cause
    }
}

// ── GetOrder ─────────────────────────────────────────────────────────────────

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    /// Owners see their own orders; admins see any.
    pub async fn execute(
        &self,
        user_id: UserId,
        role: UserRole,
        order_id: OrderId,
    ) -> Result<Order, ApiError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ApiError::OrderNotFound)?;
        if order.user_id != user_id && !role.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(order)
    }
}

// ── ListMyOrders / ListAllOrders ─────────────────────────────────────────────

pub struct ListMyOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListMyOrdersUseCase<O> {
    pub async fn execute(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<Order>, Pagination), ApiError> {
        let (orders, total) = self.orders.list_by_user(user_id, page).await?;
        Ok((orders, Pagination::new(page, total)))
    }
}

pub struct ListAllOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListAllOrdersUseCase<O> {
    pub async fn execute(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<OrderWithOwner>, Pagination), ApiError> {
        let (orders, total) = self.orders.list_all(status, page).await?;
        Ok((orders, Pagination::new(page, total)))
    }
}

// ── CancelOrder ──────────────────────────────────────────────────────────────

pub struct CancelOrderUseCase<O: OrderRepository, S: StockRepository> {
    pub orders: O,
    pub stock: S,
}

impl<O: OrderRepository, S: StockRepository> CancelOrderUseCase<O, S> {
    pub async fn execute(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ApiError> {
        // A concurrent transition makes the guarded write miss; re-read and
        // re-check. Statuses only move forward, so this ends.
        loop {
            let mut order = self
                .orders
                .find_by_id(order_id)
                .await?
                .ok_or(ApiError::OrderNotFound)?;
            if order.user_id != user_id {
                return Err(ApiError::Forbidden);
            }
            match order.status {
                OrderStatus::Cancelled => return Err(ApiError::AlreadyCancelled),
                OrderStatus::Delivered => return Err(ApiError::CannotCancelDelivered),
                _ => {}
            }

            let change = OrderStatusChange::new(
                &order,
                OrderStatus::Cancelled,
                Some(USER_CANCEL_NOTE.to_owned()),
                Utc::now(),
            );
            if !self.orders.apply_status_change(order.id, &change).await? {
                tracing::debug!(order_id = %order.id, "order status changed concurrently, retrying cancel");
                continue;
            }
            order.apply(&change);
            restore_stock(&self.stock, &order.stock_lines()).await?;

            tracing::info!(order_id = %order.id, user_id = %user_id, "order cancelled by user");
            return Ok(order);
        }
    }
}

// ── UpdateOrderStatus (admin) ────────────────────────────────────────────────

pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
    pub note: Option<String>,
}

pub struct UpdateOrderStatusUseCase<O: OrderRepository, S: StockRepository> {
    pub orders: O,
    pub stock: S,
}

impl<O: OrderRepository, S: StockRepository> UpdateOrderStatusUseCase<O, S> {
    pub async fn execute(
        &self,
        order_id: OrderId,
        input: UpdateOrderStatusInput,
    ) -> Result<Order, ApiError> {
        let note = input.note.filter(|n| !n.trim().is_empty());
        loop {
            let mut order = self
                .orders
                .find_by_id(order_id)
                .await?
                .ok_or(ApiError::OrderNotFound)?;
            let next = order.status.transition_to(input.status)?;

            let change = OrderStatusChange::new(&order, next, note.clone(), Utc::now());
            if !self.orders.apply_status_change(order.id, &change).await? {
                tracing::debug!(order_id = %order.id, "order status changed concurrently, retrying update");
                continue;
            }
            order.apply(&change);

            if next == OrderStatus::Cancelled {
                restore_stock(&self.stock, &order.stock_lines()).await?;
            }

            tracing::info!(order_id = %order.id, status = %next, "order status updated");
            return Ok(order);
        }
    }
}

// ── VerifyPayment ────────────────────────────────────────────────────────────

pub struct VerifyPaymentUseCase<O: OrderRepository, G: PaymentGateway> {
    pub orders: O,
    pub payments: G,
}

impl<O: OrderRepository, G: PaymentGateway> VerifyPaymentUseCase<O, G> {
    /// Ask the provider whether the order's payment intent settled and mark it paid.
    pub async fn execute(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ApiError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ApiError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(ApiError::Forbidden);
        }
        if order.payment_status == PaymentStatus::Paid {
            return Ok(order);
        }
        if order.status == OrderStatus::Cancelled {
            return Err(ApiError::validation("order is cancelled"));
        }
        let payment_id = order
            .payment_id
            .clone()
            .ok_or_else(|| ApiError::validation("order has no online payment"))?;

        if !self.payments.payment_succeeded(&payment_id).await? {
            return Err(ApiError::validation("payment has not been completed"));
        }
        self.orders
            .set_payment_status(order.id, PaymentStatus::Paid)
            .await?;
        order.payment_status = PaymentStatus::Paid;
        Ok(order)
    }
}
