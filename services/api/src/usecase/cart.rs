use shopdeploy_domain::id::{CartItemId, ProductId, UserId};

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::{CartItem, CartView};
use crate::error::ApiError;

fn validate_qty(qty: u32) -> Result<(), ApiError> {
    if qty == 0 {
        return Err(ApiError::validation("quantity must be at least 1"));
    }
    Ok(())
}

async fn load_view<C: CartRepository, P: ProductRepository>(
    carts: &C,
    products: &P,
    user_id: UserId,
) -> Result<CartView, ApiError> {
    let cart = carts.get_or_create(user_id).await?;
    let ids: Vec<ProductId> = cart.items.iter().map(|item| item.product_id).collect();
    let products = if ids.is_empty() {
        Vec::new()
    } else {
        products.find_by_ids(&ids).await?
    };
    Ok(CartView { cart, products })
}

// ── GetCart ──────────────────────────────────────────────────────────────────

pub struct GetCartUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> GetCartUseCase<C, P> {
    /// The user's cart; an empty one is created on first access.
    pub async fn execute(&self, user_id: UserId) -> Result<CartView, ApiError> {
        load_view(&self.carts, &self.products, user_id).await
    }
}

// ── AddToCart ────────────────────────────────────────────────────────────────

pub struct AddToCartInput {
    pub product_id: ProductId,
    pub qty: u32,
}

pub struct AddToCartUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> AddToCartUseCase<C, P> {
    /// Add a product, merging into the existing line for that product if there is one.
    pub async fn execute(
        &self,
        user_id: UserId,
        input: AddToCartInput,
    ) -> Result<CartView, ApiError> {
        validate_qty(input.qty)?;
        let product = self
            .products
            .find_by_id(input.product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        let cart = self.carts.get_or_create(user_id).await?;

        match cart.item_for_product(product.id) {
            Some(existing) => {
                let merged = existing.qty.saturating_add(input.qty);
                if product.stock < merged {
                    return Err(ApiError::InsufficientStock {
                        product: product.title,
                    });
                }
                self.carts.set_item_qty(cart.id, existing.id, merged).await?;
            }
            None => {
                if product.stock < input.qty {
                    return Err(ApiError::InsufficientStock {
                        product: product.title,
                    });
                }
                let item = CartItem {
                    id: CartItemId::new(),
                    product_id: product.id,
                    qty: input.qty,
                    price_at_add: product.price,
                };
                self.carts.add_item(cart.id, &item).await?;
            }
        }

        load_view(&self.carts, &self.products, user_id).await
    }
}

// ── UpdateCartItem ───────────────────────────────────────────────────────────

pub struct UpdateCartItemUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> UpdateCartItemUseCase<C, P> {
    pub async fn execute(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        qty: u32,
    ) -> Result<CartView, ApiError> {
        validate_qty(qty)?;
        let cart = self.carts.get_or_create(user_id).await?;
        let line = cart.item(item_id).ok_or(ApiError::CartItemNotFound)?;
        let product = self
            .products
            .find_by_id(line.product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        if product.stock < qty {
            return Err(ApiError::InsufficientStock {
                product: product.title,
            });
        }
        if !self.carts.set_item_qty(cart.id, item_id, qty).await? {
            return Err(ApiError::CartItemNotFound);
        }
        load_view(&self.carts, &self.products, user_id).await
    }
}

// ── RemoveCartItem ───────────────────────────────────────────────────────────

pub struct RemoveCartItemUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> RemoveCartItemUseCase<C, P> {
    pub async fn execute(&self, user_id: UserId, item_id: CartItemId) -> Result<CartView, ApiError> {
        let cart = self.carts.get_or_create(user_id).await?;
        if !self.carts.remove_item(cart.id, item_id).await? {
            return Err(ApiError::CartItemNotFound);
        }
        load_view(&self.carts, &self.products, user_id).await
    }
}

// ── ClearCart ────────────────────────────────────────────────────────────────

pub struct ClearCartUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> ClearCartUseCase<C, P> {
    pub async fn execute(&self, user_id: UserId) -> Result<CartView, ApiError> {
        let cart = self.carts.get_or_create(user_id).await?;
        self.carts.clear(cart.id).await?;
        load_view(&self.carts, &self.products, user_id).await
    }
}
