use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdeploy_domain::id::{CartId, CartItemId, CategoryId, OrderId, ProductId, UserId};
use shopdeploy_domain::order::{OrderStatus, PaymentMethod, PaymentStatus};
use shopdeploy_domain::pricing::{PriceBreakdown, line_total};
use shopdeploy_domain::product::ProductImage;
use shopdeploy_domain::user::UserRole;

pub const MIN_PASSWORD_LEN: usize = 6;

pub const DEFAULT_COUNTRY: &str = "India";

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub addresses: Vec<SavedAddress>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Postal address used for shipping. Also the body of a saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

impl ShippingAddress {
    /// Name of the first required field that is blank, if any.
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    #[serde(flatten)]
    pub address: ShippingAddress,
    #[serde(default)]
    pub is_default: bool,
}

/// Trimmed, lowercased form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose shape check: `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category fields embedded in product listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub images: Vec<ProductImage>,
    pub stock: u32,
    pub rating_avg: Decimal,
    pub rating_count: u32,
    pub brand: Option<String>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn first_image_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

/// Columns an admin edit overwrites. `None` leaves the stored value alone, so
/// concurrent stock decrements survive edits that do not touch `stock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub images: Option<Vec<ProductImage>>,
    pub stock: Option<u32>,
    /// `Some(None)` clears the brand.
    pub brand: Option<Option<String>>,
    pub featured: Option<bool>,
    pub is_active: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

impl ProductChanges {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(images) = &self.images {
            product.images.clone_from(images);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(brand) = &self.brand {
            product.brand.clone_from(brand);
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
        product.updated_at = self.updated_at;
    }
}

/// Product with its category populated, as returned by catalog queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListing {
    pub product: Product,
    pub category: Option<CategorySummary>,
}

/// Catalog search filters. All present filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub qty: u32,
    /// Unit price captured when the product was first added.
    pub price_at_add: Decimal,
}

impl Cart {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.qty).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| line_total(item.price_at_add, item.qty))
            .sum()
    }

    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_for_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// Cart together with the current state of every product it references.
#[derive(Debug, Clone)]
pub struct CartView {
    pub cart: Cart,
    pub products: Vec<Product>,
}

impl CartView {
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

/// Line copied from the product at checkout; later catalog edits don't touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub qty: u32,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub price: PriceBreakdown,
    pub status: OrderStatus,
    pub status_history: Vec<StatusEntry>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Quantities to give back to stock when the order is cancelled.
    pub fn stock_lines(&self) -> Vec<(ProductId, u32)> {
        self.items
            .iter()
            .map(|item| (item.product_id, item.qty))
            .collect()
    }

    /// Apply a status change in memory, mirroring what the repository persists.
    pub fn apply(&mut self, change: &OrderStatusChange) {
        self.status = change.entry.status;
        self.payment_status = change.payment_status;
        if change.delivered_at.is_some() {
            self.delivered_at = change.delivered_at;
        }
        if change.cancelled_at.is_some() {
            self.cancelled_at = change.cancelled_at;
        }
        self.updated_at = change.entry.timestamp;
        self.status_history.push(change.entry.clone());
    }
}

/// One status transition: new status, side fields, and the history entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChange {
    /// Status the order must still be in for the change to apply.
    pub from: OrderStatus,
    pub entry: StatusEntry,
    pub payment_status: PaymentStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl OrderStatusChange {
    /// Build the change for moving `order` to `status` at `now`.
    ///
    /// `delivered` marks the order paid and stamps delivery time;
    /// `cancelled` stamps cancellation time.
    pub fn new(order: &Order, status: OrderStatus, note: Option<String>, now: DateTime<Utc>) -> Self {
        let mut change = Self {
            from: order.status,
            entry: StatusEntry {
                status,
                note,
                timestamp: now,
            },
            payment_status: order.payment_status,
            delivered_at: None,
            cancelled_at: None,
        };
        match status {
            OrderStatus::Delivered => {
                change.payment_status = PaymentStatus::Paid;
                change.delivered_at = Some(now);
            }
            OrderStatus::Cancelled => change.cancelled_at = Some(now),
            _ => {}
        }
        change
    }
}

/// Name and email of an order's owner, shown in the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderOwner {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct OrderWithOwner {
    pub order: Order,
    pub owner: Option<OrderOwner>,
}

// ── Payments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    pub order_id: OrderId,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}
