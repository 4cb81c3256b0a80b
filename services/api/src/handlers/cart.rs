use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdeploy_auth_types::identity::Identity;
use shopdeploy_core::envelope::Envelope;
use shopdeploy_domain::id::{CartId, CartItemId, ProductId};
use shopdeploy_domain::pricing::line_total;

use crate::domain::types::{CartView, Product};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use crate::usecase::cart::{
    AddToCartInput, AddToCartUseCase, ClearCartUseCase, GetCartUseCase, RemoveCartItemUseCase,
    UpdateCartItemUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

/// Live product fields shown next to a cart line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: u32,
    pub is_active: bool,
}

impl From<&Product> for CartProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            price: p.price,
            image: p.first_image_url().map(str::to_owned),
            stock: p.stock,
            is_active: p.is_active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    /// `None` once the product has been removed from the catalog.
    pub product: Option<CartProductSummary>,
    pub qty: u32,
    pub price_at_add: Decimal,
    pub line_total: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: CartId,
    pub items: Vec<CartItemResponse>,
    pub total_items: u32,
    pub total_price: Decimal,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        let items = view
            .cart
            .items
            .iter()
            .map(|item| CartItemResponse {
                id: item.id,
                product_id: item.product_id,
                product: view.product(item.product_id).map(Into::into),
                qty: item.qty,
                price_at_add: item.price_at_add,
                line_total: line_total(item.price_at_add, item.qty),
            })
            .collect();
        Self {
            id: view.cart.id,
            items,
            total_items: view.cart.total_items(),
            total_price: view.cart.total_price(),
            updated_at: view.cart.updated_at,
        }
    }
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn get_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Envelope<CartResponse>, ApiError> {
    let usecase = GetCartUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase.execute(identity.user_id).await?;
    Ok(Envelope::ok("Cart retrieved", view.into()))
}

// ── POST /cart ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(alias = "quantity", default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

pub async fn add_to_cart(
    identity: Identity,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Envelope<CartResponse>, ApiError> {
    let usecase = AddToCartUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase
        .execute(
            identity.user_id,
            AddToCartInput {
                product_id: body.product_id,
                qty: body.qty,
            },
        )
        .await?;
    Ok(Envelope::ok("Item added to cart", view.into()))
}

// ── PUT /cart/{itemId} ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    #[serde(alias = "quantity")]
    pub qty: u32,
}

pub async fn update_cart_item(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateCartItemRequest>,
) -> Result<Envelope<CartResponse>, ApiError> {
    let usecase = UpdateCartItemUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase.execute(identity.user_id, item_id, body.qty).await?;
    Ok(Envelope::ok("Cart updated", view.into()))
}

// ── DELETE /cart/{itemId} ────────────────────────────────────────────────────

pub async fn remove_cart_item(
    identity: Identity,
    State(state): State<AppState>,
    ApiPath(item_id): ApiPath<CartItemId>,
) -> Result<Envelope<CartResponse>, ApiError> {
    let usecase = RemoveCartItemUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase.execute(identity.user_id, item_id).await?;
    Ok(Envelope::ok("Item removed from cart", view.into()))
}

// ── DELETE /cart ─────────────────────────────────────────────────────────────

pub async fn clear_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Envelope<CartResponse>, ApiError> {
    let usecase = ClearCartUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let view = usecase.execute(identity.user_id).await?;
    Ok(Envelope::ok("Cart cleared", view.into()))
}
