use rust_decimal_macros::dec;

use shopdeploy_api::domain::types::Product;
use shopdeploy_api::error::ApiError;
use shopdeploy_api::usecase::cart::{
    AddToCartInput, AddToCartUseCase, ClearCartUseCase, GetCartUseCase, RemoveCartItemUseCase,
    UpdateCartItemUseCase,
};
use shopdeploy_domain::id::{CartItemId, ProductId, UserId};

use crate::helpers::{InMemoryStore, test_category, test_product};

fn store_with_book() -> (InMemoryStore, Product) {
    let store = InMemoryStore::new();
    let category = test_category("Books");
    let book = test_product(category.id, "Rust in Action", dec!(45.50), 5);
    store.add_category(category);
    store.add_product(book.clone());
    (store, book)
}

fn add(store: &InMemoryStore) -> AddToCartUseCase<InMemoryStore, InMemoryStore> {
    AddToCartUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
}

#[tokio::test]
async fn should_create_empty_cart_on_first_access() {
    let (store, _) = store_with_book();
    let user_id = UserId::new();

    let view = GetCartUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
    .execute(user_id)
    .await
    .unwrap();

    assert!(view.cart.is_empty());
    assert_eq!(view.cart.user_id, user_id);
    assert_eq!(store.with(|s| s.carts.len()), 1);
}

#[tokio::test]
async fn should_add_item_with_price_captured_at_add_time() {
    let (store, book) = store_with_book();
    let user_id = UserId::new();

    let view = add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: book.id,
                qty: 2,
            },
        )
        .await
        .unwrap();

    assert_eq!(view.cart.items.len(), 1);
    assert_eq!(view.cart.items[0].price_at_add, dec!(45.50));
    assert_eq!(view.cart.total_items(), 2);
    assert_eq!(view.cart.total_price(), dec!(91.00));
    assert!(view.product(book.id).is_some());

    // A later price change leaves the cart line alone.
    store.with(|s| s.products[0].price = dec!(99));
    let view = GetCartUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
    .execute(user_id)
    .await
    .unwrap();
    assert_eq!(view.cart.items[0].price_at_add, dec!(45.50));
}

#[tokio::test]
async fn should_merge_repeat_adds_into_one_line() {
    let (store, book) = store_with_book();
    let user_id = UserId::new();
    let input = || AddToCartInput {
        product_id: book.id,
        qty: 2,
    };

    add(&store).execute(user_id, input()).await.unwrap();
    let view = add(&store).execute(user_id, input()).await.unwrap();

    assert_eq!(view.cart.items.len(), 1);
    assert_eq!(view.cart.items[0].qty, 4);
}

#[tokio::test]
async fn should_check_stock_against_merged_quantity() {
    let (store, book) = store_with_book();
    let user_id = UserId::new();
    add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: book.id,
                qty: 4,
            },
        )
        .await
        .unwrap();

    let result = add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: book.id,
                qty: 2,
            },
        )
        .await;

    assert!(
        matches!(result, Err(ApiError::InsufficientStock { .. })),
        "expected InsufficientStock, got {result:?}"
    );
    assert_eq!(store.cart_items(user_id)[0].qty, 4);
}

#[tokio::test]
async fn should_reject_unknown_product_and_zero_quantity() {
    let (store, book) = store_with_book();
    let user_id = UserId::new();

    let missing = add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: ProductId::new(),
                qty: 1,
            },
        )
        .await;
    assert!(
        matches!(missing, Err(ApiError::ProductNotFound)),
        "expected ProductNotFound, got {missing:?}"
    );

    let zero = add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: book.id,
                qty: 0,
            },
        )
        .await;
    assert!(
        matches!(zero, Err(ApiError::Validation(_))),
        "expected Validation, got {zero:?}"
    );
}

#[tokio::test]
async fn should_update_quantity_within_current_stock() {
    let (store, book) = store_with_book();
    let user_id = UserId::new();
    let view = add(&store)
        .execute(
            user_id,
            AddToCartInput {
                product_id: book.id,
                qty: 1,
            },
        )
        .await
        .unwrap();
    let item_id = view.cart.items[0].id;
    let usecase = UpdateCartItemUseCase {
        carts: store.clone(),
        products: store.clone(),
    };

    let view = usecase.execute(user_id, item_id, 5).await.unwrap();
    assert_eq!(view.cart.items[0].qty, 5);

    let result = usecase.execute(user_id, item_id, 6).await;
    assert!(
        matches!(result, Err(ApiError::InsufficientStock { .. })),
        "expected InsufficientStock, got {result:?}"
    );

    let result = usecase.execute(user_id, CartItemId::new(), 1).await;
    assert!(
        matches!(result, Err(ApiError::CartItemNotFound)),
        "expected CartItemNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_remove_line_and_clear_cart() {
    let (store, book) = store_with_book();
    let category_id = book.category_id;
    let pen = test_product(category_id, "Pen", dec!(10), 100);
    store.add_product(pen.clone());
    let user_id = UserId::new();
    store.put_in_cart(user_id, &book, 1);
    store.put_in_cart(user_id, &pen, 3);
    let book_line = store.cart_items(user_id)[0].id;

    let view = RemoveCartItemUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
    .execute(user_id, book_line)
    .await
    .unwrap();
    assert_eq!(view.cart.items.len(), 1);
    assert_eq!(view.cart.items[0].product_id, pen.id);

    let again = RemoveCartItemUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
    .execute(user_id, book_line)
    .await;
    assert!(
        matches!(again, Err(ApiError::CartItemNotFound)),
        "expected CartItemNotFound, got {again:?}"
    );

    let view = ClearCartUseCase {
        carts: store.clone(),
        products: store.clone(),
    }
    .execute(user_id)
    .await
    .unwrap();
    assert!(view.cart.is_empty());
    assert_eq!(store.with(|s| s.carts.len()), 1);
}
