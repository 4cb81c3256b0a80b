use rust_decimal_macros::dec;

use shopdeploy_api::domain::repository::StockRepository;
use shopdeploy_api::domain::types::ProductFilter;
use shopdeploy_api::error::ApiError;
use shopdeploy_api::usecase::category::{
    CreateCategoryInput, CreateCategoryUseCase, DeleteCategoryUseCase, ListCategoriesUseCase,
    UpdateCategoryInput, UpdateCategoryUseCase,
};
use shopdeploy_api::usecase::product::{
    CreateProductInput, CreateProductUseCase, DeleteProductUseCase, GetProductUseCase,
    ListProductsUseCase, UpdateProductInput, UpdateProductUseCase,
};
use shopdeploy_domain::id::{CategoryId, ProductId};
use shopdeploy_domain::pagination::{PageRequest, Sort};
use shopdeploy_domain::product::ProductSortBy;

use crate::helpers::{InMemoryStore, test_category, test_product};

fn category_input(name: &str) -> CreateCategoryInput {
    CreateCategoryInput {
        name: name.into(),
        description: Some("  ".into()),
        image: None,
        is_active: true,
    }
}

fn product_input(category_id: CategoryId) -> CreateProductInput {
    CreateProductInput {
        title: "  Desk Lamp ".into(),
        description: "LED lamp".into(),
        price: dec!(54.99),
        category_id,
        images: Vec::new(),
        stock: 10,
        brand: None,
        featured: false,
        is_active: true,
    }
}

// ── Categories ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_category_with_slug() {
    let store = InMemoryStore::new();

    let category = CreateCategoryUseCase {
        categories: store.clone(),
    }
    .execute(category_input(" Home & Garden "))
    .await
    .unwrap();

    assert_eq!(category.name, "Home & Garden");
    assert_eq!(category.slug, "home-garden");
    assert_eq!(category.description, None);
}

#[tokio::test]
async fn should_reject_category_whose_name_or_slug_is_taken() {
    let store = InMemoryStore::new();
    let usecase = CreateCategoryUseCase {
        categories: store.clone(),
    };
    usecase.execute(category_input("Home & Garden")).await.unwrap();

    let result = usecase.execute(category_input("Home Garden")).await;

    assert!(
        matches!(result, Err(ApiError::CategoryAlreadyExists)),
        "expected CategoryAlreadyExists, got {result:?}"
    );
}

#[tokio::test]
async fn should_regenerate_slug_on_rename() {
    let store = InMemoryStore::new();
    let category = test_category("Books");
    store.add_category(category.clone());

    let updated = UpdateCategoryUseCase {
        categories: store.clone(),
    }
    .execute(
        category.id,
        UpdateCategoryInput {
            name: Some("Rare Books".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.slug, "rare-books");
    assert_eq!(store.with(|s| s.categories[0].slug.clone()), "rare-books");
}

#[tokio::test]
async fn should_list_only_active_categories_by_name() {
    let store = InMemoryStore::new();
    store.add_category(test_category("Sports"));
    store.add_category(test_category("Books"));
    let mut hidden = test_category("Archive");
    hidden.is_active = false;
    store.add_category(hidden);

    let list = ListCategoriesUseCase {
        categories: store.clone(),
    }
    .execute()
    .await
    .unwrap();

    let names: Vec<_> = list.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Books", "Sports"]);
}

#[tokio::test]
async fn should_block_deleting_category_in_use() {
    let store = InMemoryStore::new();
    let category = test_category("Books");
    store.add_category(category.clone());
    let book = test_product(category.id, "Dune", dec!(9.99), 1);
    store.add_product(book.clone());
    let usecase = DeleteCategoryUseCase {
        categories: store.clone(),
        products: store.clone(),
    };

    let result = usecase.execute(category.id).await;
    assert!(
        matches!(result, Err(ApiError::Validation(_))),
        "expected Validation, got {result:?}"
    );

    store.with(|s| s.products.clear());
    usecase.execute(category.id).await.unwrap();
    let missing = usecase.execute(category.id).await;
    assert!(
        matches!(missing, Err(ApiError::CategoryNotFound)),
        "expected CategoryNotFound, got {missing:?}"
    );
}

// ── Products ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_product_in_existing_category() {
    let store = InMemoryStore::new();
    let category = test_category("Home & Garden");
    store.add_category(category.clone());
    let usecase = CreateProductUseCase {
        products: store.clone(),
        categories: store.clone(),
    };

    let product = usecase.execute(product_input(category.id)).await.unwrap();
    assert_eq!(product.title, "Desk Lamp");
    assert_eq!(product.rating_count, 0);

    let result = usecase.execute(product_input(CategoryId::new())).await;
    assert!(
        matches!(result, Err(ApiError::CategoryNotFound)),
        "expected CategoryNotFound, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_negative_price_and_blank_title() {
    let store = InMemoryStore::new();
    let category = test_category("Home & Garden");
    store.add_category(category.clone());
    let usecase = CreateProductUseCase {
        products: store.clone(),
        categories: store.clone(),
    };

    let mut negative = product_input(category.id);
    negative.price = dec!(-1);
    let mut blank = product_input(category.id);
    blank.title = "   ".into();

    for input in [negative, blank] {
        let result = usecase.execute(input).await;
        assert!(
            matches!(result, Err(ApiError::Validation(_))),
            "expected Validation, got {result:?}"
        );
    }
    assert!(store.with(|s| s.products.is_empty()));
}

#[tokio::test]
async fn should_update_product_partially() {
    let store = InMemoryStore::new();
    let category = test_category("Books");
    store.add_category(category.clone());
    let book = test_product(category.id, "Dune", dec!(9.99), 4);
    store.add_product(book.clone());

    let updated = UpdateProductUseCase {
        products: store.clone(),
        categories: store.clone(),
    }
    .execute(
        book.id,
        UpdateProductInput {
            price: Some(dec!(12.50)),
            stock: Some(0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.price, dec!(12.50));
    assert_eq!(store.stock_of(book.id), 0);
}

#[tokio::test]
async fn should_keep_concurrent_stock_decrement_when_editing_title() {
    let store = InMemoryStore::new();
    let category = test_category("Home & Garden");
    store.add_category(category.clone());
    let mug = test_product(category.id, "Mug", dec!(250), 10);
    store.add_product(mug.clone());
    store.with(|s| s.yield_after_read = true);
    let usecase = UpdateProductUseCase {
        products: store.clone(),
        categories: store.clone(),
    };

    // The edit reads the product, then a checkout takes 4 before it writes.
    let (updated, decremented) = tokio::join!(
        usecase.execute(
            mug.id,
            UpdateProductInput {
                title: Some("Stoneware Mug".into()),
                ..Default::default()
            },
        ),
        store.try_decrement(mug.id, 4),
    );

    assert_eq!(updated.unwrap().title, "Stoneware Mug");
    assert!(decremented.unwrap());
    assert_eq!(store.stock_of(mug.id), 6);
}

#[tokio::test]
async fn should_embed_category_when_fetching_product() {
    let store = InMemoryStore::new();
    let category = test_category("Books");
    store.add_category(category.clone());
    let book = test_product(category.id, "Dune", dec!(9.99), 4);
    store.add_product(book.clone());
    let usecase = GetProductUseCase {
        products: store.clone(),
        categories: store.clone(),
    };

    let listing = usecase.execute(book.id).await.unwrap();
    assert_eq!(listing.category.unwrap().slug, "books");

    let missing = usecase.execute(ProductId::new()).await;
    assert!(
        matches!(missing, Err(ApiError::ProductNotFound)),
        "expected ProductNotFound, got {missing:?}"
    );
}

#[tokio::test]
async fn should_delete_product_once() {
    let store = InMemoryStore::new();
    let book = test_product(CategoryId::new(), "Dune", dec!(9.99), 4);
    store.add_product(book.clone());
    let usecase = DeleteProductUseCase {
        products: store.clone(),
    };

    usecase.execute(book.id).await.unwrap();
    let again = usecase.execute(book.id).await;

    assert!(
        matches!(again, Err(ApiError::ProductNotFound)),
        "expected ProductNotFound, got {again:?}"
    );
}

// ── Catalog query ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_filter_by_price_range_and_search() {
    let store = InMemoryStore::new();
    let category = test_category("Electronics");
    for (title, price) in [
        ("Wireless Mouse", dec!(39.99)),
        ("Mechanical Keyboard", dec!(129.99)),
        ("Wireless Speaker", dec!(59.99)),
    ] {
        store.add_product(test_product(category.id, title, price, 5));
    }
    let usecase = ListProductsUseCase {
        products: store.clone(),
    };

    let (listings, pagination) = usecase
        .execute(
            ProductFilter {
                search: Some("  wireless ".into()),
                max_price: Some(dec!(50)),
                ..Default::default()
            },
            ProductSortBy::default(),
            PageRequest::new(None, None, 12),
        )
        .await
        .unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].product.title, "Wireless Mouse");
    assert_eq!(pagination.total, 1);
    assert_eq!(pagination.limit, 12);
}

#[tokio::test]
async fn should_paginate_and_sort_by_price() {
    let store = InMemoryStore::new();
    let category = test_category("Sports");
    for i in 1..=5u32 {
        store.add_product(test_product(
            category.id,
            &format!("Item {i}"),
            rust_decimal::Decimal::from(i * 10),
            1,
        ));
    }

    let (listings, pagination) = ListProductsUseCase {
        products: store.clone(),
    }
    .execute(
        ProductFilter::default(),
        ProductSortBy::Price(Sort::Desc),
        PageRequest::new(Some(2), Some(2), 12),
    )
    .await
    .unwrap();

    let prices: Vec<_> = listings.iter().map(|l| l.product.price).collect();
    assert_eq!(prices, [dec!(30), dec!(20)]);
    assert_eq!(pagination.total, 5);
    assert_eq!(pagination.pages, 3);
}

#[tokio::test]
async fn should_reject_inverted_price_range() {
    let result = ListProductsUseCase {
        products: InMemoryStore::new(),
    }
    .execute(
        ProductFilter {
            min_price: Some(dec!(100)),
            max_price: Some(dec!(10)),
            ..Default::default()
        },
        ProductSortBy::default(),
        PageRequest::new(None, None, 12),
    )
    .await;

    assert!(
        matches!(result, Err(ApiError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}
