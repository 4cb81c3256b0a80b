use rust_decimal_macros::dec;

use shopdeploy_api::domain::types::Product;
use shopdeploy_api::error::ApiError;
use shopdeploy_api::usecase::order::{
    CancelOrderUseCase, CreateOrderInput, CreateOrderOutput, CreateOrderUseCase, GetOrderUseCase,
    ListAllOrdersUseCase, ListMyOrdersUseCase, PAYMENT_FAILED_NOTE, USER_CANCEL_NOTE,
    UpdateOrderStatusInput, UpdateOrderStatusUseCase, VerifyPaymentUseCase,
};
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::order::{OrderStatus, PaymentMethod, PaymentStatus};
use shopdeploy_domain::pagination::PageRequest;
use shopdeploy_domain::user::UserRole;

use crate::helpers::{InMemoryStore, MockGateway, test_address, test_category, test_product};

struct Shop {
    store: InMemoryStore,
    mug: Product,
    lamp: Product,
}

/// Mug at 250 with 10 in stock, lamp at 600 with 3 in stock.
fn shop() -> Shop {
    let store = InMemoryStore::new();
    let category = test_category("Home & Garden");
    let mug = test_product(category.id, "Mug", dec!(250), 10);
    let lamp = test_product(category.id, "Lamp", dec!(600), 3);
    store.add_category(category);
    store.add_product(mug.clone());
    store.add_product(lamp.clone());
    Shop { store, mug, lamp }
}

fn checkout(
    store: &InMemoryStore,
    gateway: MockGateway,
) -> CreateOrderUseCase<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore, MockGateway>
{
    CreateOrderUseCase {
        carts: store.clone(),
        products: store.clone(),
        stock: store.clone(),
        orders: store.clone(),
        payments: gateway,
        currency: "inr".into(),
    }
}

async fn place_cod_order(shop: &Shop, user_id: UserId) -> CreateOrderOutput {
    shop.store.put_in_cart(user_id, &shop.mug, 2);
    checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await
        .unwrap()
}

// ── CreateOrderUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_order_decrement_stock_and_empty_cart() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 2);
    shop.store.put_in_cart(user_id, &shop.lamp, 1);

    let out = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await
        .unwrap();

    let order = out.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.price.items_price, dec!(1100));
    assert_eq!(order.price.shipping_price, dec!(0));
    assert_eq!(order.price.tax_price, dec!(198.00));
    assert_eq!(order.price.total_amount, dec!(1298.00));
    assert_eq!(order.status_history.len(), 1);
    assert_eq!(order.status_history[0].status, OrderStatus::Pending);
    assert!(out.client_secret.is_none());

    assert_eq!(shop.store.stock_of(shop.mug.id), 8);
    assert_eq!(shop.store.stock_of(shop.lamp.id), 2);
    assert!(shop.store.cart_items(user_id).is_empty());
    assert_eq!(shop.store.order(order.id).id, order.id);
}

#[tokio::test]
async fn should_charge_flat_shipping_below_threshold() {
    let shop = shop();
    let user_id = UserId::new();

    let order = place_cod_order(&shop, user_id).await.order;

    assert_eq!(order.price.items_price, dec!(500));
    assert_eq!(order.price.shipping_price, dec!(50));
    assert_eq!(order.price.tax_price, dec!(90.00));
    assert_eq!(order.price.total_amount, dec!(640.00));
}

#[tokio::test]
async fn should_snapshot_current_product_price_and_title() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 1);
    shop.store.with(|s| {
        let mug = s.products.iter_mut().find(|p| p.id == shop.mug.id).unwrap();
        mug.price = dec!(300);
        mug.title = "Mug v2".into();
    });

    let order = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await
        .unwrap()
        .order;

    assert_eq!(order.items[0].price, dec!(300));
    assert_eq!(order.items[0].title, "Mug v2");
}

#[tokio::test]
async fn should_fail_with_empty_cart_without_touching_stock() {
    let shop = shop();
    let user_id = UserId::new();

    let result = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    assert!(
        matches!(result, Err(ApiError::EmptyCart)),
        "expected EmptyCart, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.stock_of(shop.lamp.id), 3);
}

#[tokio::test]
async fn should_reject_missing_address_field() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 1);
    let mut address = test_address();
    address.pincode = " ".into();

    let result = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: address,
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    match result {
        Err(ApiError::Validation(msg)) => assert_eq!(msg, "shippingAddress.pincode is required"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn should_fail_when_cart_exceeds_stock_without_reserving() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 2);
    shop.store.put_in_cart(user_id, &shop.lamp, 4);

    let result = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    assert!(
        matches!(&result, Err(ApiError::InsufficientStock { product }) if product == "Lamp"),
        "expected InsufficientStock, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.cart_items(user_id).len(), 2);
}

#[tokio::test]
async fn should_compensate_reserved_stock_when_later_line_runs_short() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 2);
    shop.store.put_in_cart(user_id, &shop.lamp, 1);
    // Lamp passes the read-only check but loses the race for the last units.
    shop.store.with(|s| s.short_stock.insert(shop.lamp.id));

    let result = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    assert!(
        matches!(result, Err(ApiError::InsufficientStock { .. })),
        "expected InsufficientStock, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.stock_of(shop.lamp.id), 3);
    assert_eq!(shop.store.cart_items(user_id).len(), 2);
    assert!(shop.store.with(|s| s.orders.is_empty()));
}

#[tokio::test]
async fn should_compensate_stock_when_order_insert_fails() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 2);
    shop.store.with(|s| s.fail_order_create = true);

    let result = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Cod,
            },
        )
        .await;

    assert!(
        matches!(result, Err(ApiError::Internal(_))),
        "expected Internal, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.cart_items(user_id).len(), 1);
}

#[tokio::test]
async fn should_attach_payment_intent_for_online_orders() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.lamp, 1);
    let gateway = MockGateway::default();
    let requests = gateway.requests.clone();

    let out = checkout(&shop.store, gateway)
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Stripe,
            },
        )
        .await
        .unwrap();

    assert_eq!(out.client_secret.as_deref(), Some("pi_secret_test"));
    let stored = shop.store.order(out.order.id);
    assert_eq!(stored.payment_id, out.order.payment_id);
    assert!(stored.payment_id.is_some());

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    // 600 + 0 shipping + 108 tax
    assert_eq!(requests[0].amount, 70800);
    assert_eq!(requests[0].currency, "inr");
}

#[tokio::test]
async fn should_cancel_order_and_restore_stock_when_payment_setup_fails() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 3);

    let result = checkout(&shop.store, MockGateway::failing())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Online,
            },
        )
        .await;

    assert!(
        matches!(result, Err(ApiError::UpstreamPayment(_))),
        "expected UpstreamPayment, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.cart_items(user_id).len(), 1);

    let order = shop.store.with(|s| s.orders[0].clone());
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert!(order.cancelled_at.is_some());
    assert_eq!(
        order.status_history.last().unwrap().note.as_deref(),
        Some(PAYMENT_FAILED_NOTE)
    );
}

// ── CancelOrderUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_cancel_pending_order_and_restore_stock() {
    let shop = shop();
    let user_id = UserId::new();
    let order = place_cod_order(&shop, user_id).await.order;
    assert_eq!(shop.store.stock_of(shop.mug.id), 8);

    let usecase = CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };
    let cancelled = usecase.execute(user_id, order.id).await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(
        cancelled.status_history.last().unwrap().note.as_deref(),
        Some(USER_CANCEL_NOTE)
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    assert_eq!(shop.store.order(order.id).status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn should_not_restore_stock_twice_on_repeated_cancel() {
    let shop = shop();
    let user_id = UserId::new();
    let order = place_cod_order(&shop, user_id).await.order;
    let usecase = CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };
    usecase.execute(user_id, order.id).await.unwrap();

    let result = usecase.execute(user_id, order.id).await;

    assert!(
        matches!(result, Err(ApiError::AlreadyCancelled)),
        "expected AlreadyCancelled, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
}

#[tokio::test]
async fn should_restore_stock_once_when_user_and_admin_cancel_together() {
    let shop = shop();
    let user_id = UserId::new();
    let order = place_cod_order(&shop, user_id).await.order;
    shop.store.with(|s| s.yield_after_read = true);
    let user_cancel = CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };
    let admin_update = UpdateOrderStatusUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };

    // Both read the order as pending before either writes.
    let (by_user, by_admin) = tokio::join!(
        user_cancel.execute(user_id, order.id),
        admin_update.execute(
            order.id,
            UpdateOrderStatusInput {
                status: OrderStatus::Cancelled,
                note: None,
            },
        ),
    );

    match (&by_user, &by_admin) {
        (Ok(_), Err(ApiError::InvalidTransition(_))) => {}
        (Err(ApiError::AlreadyCancelled), Ok(_)) => {}
        _ => panic!("expected exactly one cancel to win, got {by_user:?} / {by_admin:?}"),
    }
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
    let history: Vec<_> = shop
        .store
        .order(order.id)
        .status_history
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(history, [OrderStatus::Pending, OrderStatus::Cancelled]);
}

#[tokio::test]
async fn should_refuse_to_cancel_delivered_order() {
    let shop = shop();
    let user_id = UserId::new();
    let order = place_cod_order(&shop, user_id).await.order;
    shop.store.with(|s| s.orders[0].status = OrderStatus::Delivered);

    let usecase = CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };
    let result = usecase.execute(user_id, order.id).await;

    assert!(
        matches!(result, Err(ApiError::CannotCancelDelivered)),
        "expected CannotCancelDelivered, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 8);
}

#[tokio::test]
async fn should_forbid_cancelling_another_users_order() {
    let shop = shop();
    let order = place_cod_order(&shop, UserId::new()).await.order;

    let usecase = CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };
    let result = usecase.execute(UserId::new(), order.id).await;

    assert!(
        matches!(result, Err(ApiError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
    assert_eq!(shop.store.order(order.id).status, OrderStatus::Pending);
}

// ── GetOrderUseCase ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_let_owner_and_admin_view_order_but_not_others() {
    let shop = shop();
    let owner = UserId::new();
    let order = place_cod_order(&shop, owner).await.order;
    let usecase = GetOrderUseCase {
        orders: shop.store.clone(),
    };

    assert!(usecase.execute(owner, UserRole::Customer, order.id).await.is_ok());
    assert!(usecase.execute(UserId::new(), UserRole::Admin, order.id).await.is_ok());
    let result = usecase.execute(UserId::new(), UserRole::Customer, order.id).await;
    assert!(
        matches!(result, Err(ApiError::Forbidden)),
        "expected Forbidden, got {result:?}"
    );
}

// ── UpdateOrderStatusUseCase ─────────────────────────────────────────────────

#[tokio::test]
async fn should_mark_paid_when_admin_delivers() {
    let shop = shop();
    let order = place_cod_order(&shop, UserId::new()).await.order;
    let usecase = UpdateOrderStatusUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };

    for status in [OrderStatus::Processing, OrderStatus::Shipped] {
        usecase
            .execute(order.id, UpdateOrderStatusInput { status, note: None })
            .await
            .unwrap();
    }
    let delivered = usecase
        .execute(
            order.id,
            UpdateOrderStatusInput {
                status: OrderStatus::Delivered,
                note: Some("Left at door".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);
    assert!(delivered.delivered_at.is_some());
    assert_eq!(delivered.status_history.len(), 4);
    assert_eq!(
        delivered.status_history.last().unwrap().note.as_deref(),
        Some("Left at door")
    );
    assert_eq!(shop.store.order(order.id).payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn should_restore_stock_when_admin_cancels() {
    let shop = shop();
    let order = place_cod_order(&shop, UserId::new()).await.order;
    let usecase = UpdateOrderStatusUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    };

    usecase
        .execute(
            order.id,
            UpdateOrderStatusInput {
                status: OrderStatus::Cancelled,
                note: Some("  ".into()),
            },
        )
        .await
        .unwrap();

    let stored = shop.store.order(order.id);
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert_eq!(stored.status_history.last().unwrap().note, None);
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);

    let result = usecase
        .execute(
            order.id,
            UpdateOrderStatusInput {
                status: OrderStatus::Cancelled,
                note: None,
            },
        )
        .await;
    assert!(
        matches!(result, Err(ApiError::InvalidTransition(_))),
        "expected InvalidTransition, got {result:?}"
    );
    assert_eq!(shop.store.stock_of(shop.mug.id), 10);
}

// ── List orders ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_list_only_own_orders() {
    let shop = shop();
    let me = UserId::new();
    place_cod_order(&shop, me).await;
    place_cod_order(&shop, UserId::new()).await;

    let usecase = ListMyOrdersUseCase {
        orders: shop.store.clone(),
    };
    let (orders, pagination) = usecase
        .execute(me, PageRequest::new(None, None, 10))
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].user_id, me);
    assert_eq!(pagination.total, 1);
    assert_eq!(pagination.pages, 1);
}

#[tokio::test]
async fn should_filter_all_orders_by_status() {
    let shop = shop();
    let first = place_cod_order(&shop, UserId::new()).await.order;
    place_cod_order(&shop, UserId::new()).await;
    CancelOrderUseCase {
        orders: shop.store.clone(),
        stock: shop.store.clone(),
    }
    .execute(first.user_id, first.id)
    .await
    .unwrap();

    let usecase = ListAllOrdersUseCase {
        orders: shop.store.clone(),
    };
    let (rows, pagination) = usecase
        .execute(Some(OrderStatus::Cancelled), PageRequest::new(None, None, 20))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order.id, first.id);
    assert_eq!(pagination.total, 1);
}

// ── VerifyPaymentUseCase ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_mark_online_order_paid_once_provider_confirms() {
    let shop = shop();
    let user_id = UserId::new();
    shop.store.put_in_cart(user_id, &shop.mug, 1);
    let order = checkout(&shop.store, MockGateway::default())
        .execute(
            user_id,
            CreateOrderInput {
                shipping_address: test_address(),
                payment_method: PaymentMethod::Stripe,
            },
        )
        .await
        .unwrap()
        .order;

    let pending = VerifyPaymentUseCase {
        orders: shop.store.clone(),
        payments: MockGateway::default(),
    }
    .execute(user_id, order.id)
    .await;
    assert!(
        matches!(pending, Err(ApiError::Validation(_))),
        "expected Validation, got {pending:?}"
    );

    let paid = VerifyPaymentUseCase {
        orders: shop.store.clone(),
        payments: MockGateway::settled(),
    }
    .execute(user_id, order.id)
    .await
    .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(shop.store.order(order.id).payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn should_reject_payment_verification_for_cod_order() {
    let shop = shop();
    let user_id = UserId::new();
    let order = place_cod_order(&shop, user_id).await.order;

    let result = VerifyPaymentUseCase {
        orders: shop.store.clone(),
        payments: MockGateway::settled(),
    }
    .execute(user_id, order.id)
    .await;

    match result {
        Err(ApiError::Validation(msg)) => assert_eq!(msg, "order has no online payment"),
        other => panic!("expected Validation, got {other:?}"),
    }
}
