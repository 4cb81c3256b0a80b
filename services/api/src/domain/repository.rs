#![allow(async_fn_in_trait)]

use shopdeploy_domain::id::{CartId, CartItemId, CategoryId, OrderId, ProductId, UserId};
use shopdeploy_domain::order::{OrderStatus, PaymentStatus};
use shopdeploy_domain::pagination::PageRequest;
use shopdeploy_domain::product::ProductSortBy;

use crate::domain::types::{
    Cart, CartItem, Category, Order, OrderStatusChange, OrderWithOwner, PaymentIntent,
    PaymentIntentRequest, Product, ProductChanges, ProductFilter, ProductListing, SavedAddress,
    User,
};
use crate::error::ApiError;

/// Repository for user accounts and their single refresh-token session.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn create(&self, user: &User) -> Result<(), ApiError>;
    /// Replace the stored refresh token; `None` ends the session.
    async fn set_refresh_token(&self, id: UserId, token: Option<&str>) -> Result<(), ApiError>;
    async fn replace_addresses(
        &self,
        id: UserId,
        addresses: &[SavedAddress],
    ) -> Result<(), ApiError>;
}

pub trait CategoryRepository: Send + Sync {
    /// Active categories ordered by name.
    async fn list_active(&self) -> Result<Vec<Category>, ApiError>;
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, ApiError>;
    /// Any category already holding `name` or `slug`.
    async fn find_by_name_or_slug(
        &self,
        name: &str,
        slug: &str,
    ) -> Result<Option<Category>, ApiError>;
    async fn create(&self, category: &Category) -> Result<(), ApiError>;
    async fn update(&self, category: &Category) -> Result<(), ApiError>;
    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: CategoryId) -> Result<bool, ApiError>;
}

pub trait ProductRepository: Send + Sync {
    /// One page of active products matching `filter`, plus the total match count.
    async fn search(
        &self,
        filter: &ProductFilter,
        sort_by: ProductSortBy,
        page: PageRequest,
    ) -> Result<(Vec<ProductListing>, u64), ApiError>;
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ApiError>;
    /// Products among `ids` that exist, in no particular order.
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ApiError>;
    async fn create(&self, product: &Product) -> Result<(), ApiError>;
    /// Write only the supplied columns and return the stored row, or `None`
    /// if the product no longer exists.
    async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, ApiError>;
    /// Returns `true` if a row was deleted.
    async fn delete(&self, id: ProductId) -> Result<bool, ApiError>;
    async fn count_by_category(&self, category_id: CategoryId) -> Result<u64, ApiError>;
}

/// Atomic per-product stock adjustments.
pub trait StockRepository: Send + Sync {
    /// Decrement stock by `qty` only if at least `qty` is available.
    ///
    /// Returns `false` (and changes nothing) when stock is short or the product is gone.
    async fn try_decrement(&self, id: ProductId, qty: u32) -> Result<bool, ApiError>;
    /// Give `qty` back to stock. A missing product is not an error.
    async fn increment(&self, id: ProductId, qty: u32) -> Result<(), ApiError>;
}

pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, ApiError>;
    /// Return the user's cart, creating an empty one on first access.
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, ApiError>;
    async fn add_item(&self, cart_id: CartId, item: &CartItem) -> Result<(), ApiError>;
    /// Returns `false` when the line does not belong to the cart.
    async fn set_item_qty(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        qty: u32,
    ) -> Result<bool, ApiError>;
    /// Returns `false` when the line does not belong to the cart.
    async fn remove_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool, ApiError>;
    /// Delete every line; the cart row itself is kept.
    async fn clear(&self, cart_id: CartId) -> Result<(), ApiError>;
}

pub trait OrderRepository: Send + Sync {
    /// Persist the order, its items and its initial history in one transaction.
    async fn create(&self, order: &Order) -> Result<(), ApiError>;
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, ApiError>;
    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), ApiError>;
    /// Newest first, optionally restricted to one status.
    async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<OrderWithOwner>, u64), ApiError>;
    /// Update status fields and append the history entry in one transaction.
    ///
    /// Returns `false`, writing nothing, when the order is no longer in
    /// `change.from`.
    async fn apply_status_change(
        &self,
        id: OrderId,
        change: &OrderStatusChange,
    ) -> Result<bool, ApiError>;
    async fn set_payment_id(&self, id: OrderId, payment_id: &str) -> Result<(), ApiError>;
    async fn set_payment_status(&self, id: OrderId, status: PaymentStatus)
    -> Result<(), ApiError>;
}

/// External payment provider.
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError>;
    /// Whether the provider reports the intent as settled.
    async fn payment_succeeded(&self, payment_id: &str) -> Result<bool, ApiError>;
}
