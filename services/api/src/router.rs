use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shopdeploy_core::health::healthz;
use shopdeploy_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    auth::{get_me, login, logout, refresh_token, register, replace_addresses},
    cart::{add_to_cart, clear_cart, get_cart, remove_cart_item, update_cart_item},
    category::{create_category, delete_category, get_category, list_categories, update_category},
    health::readyz,
    order::{
        cancel_order, create_order, get_order, list_all_orders, list_my_orders,
        update_order_status, verify_payment,
    },
    product::{create_product, delete_product, get_product, list_products, update_product},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .route("/auth/me/addresses", put(replace_addresses))
        // Categories
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        // Products
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        // Cart
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/cart/{item_id}",
            put(update_cart_item).delete(remove_cart_item),
        )
        // Orders
        .route("/orders", get(list_my_orders).post(create_order))
        .route("/orders/all", get(list_all_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", put(cancel_order))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/orders/{id}/pay", put(verify_payment))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}

/// CORS for a single browser origin with cookies allowed.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
