use axum::http::HeaderValue;
use sea_orm::Database;
use tracing::info;

use shopdeploy_api::config::ApiConfig;
use shopdeploy_api::infra::payment::StripePaymentClient;
use shopdeploy_api::router::{build_router, cors_layer};
use shopdeploy_api::state::AppState;
use shopdeploy_api::usecase::auth::JwtSecrets;
use shopdeploy_auth_types::cookie::CookieSettings;
use shopdeploy_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing("info,shopdeploy_api=debug");

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let payments = StripePaymentClient::new(&config.stripe_api_base, config.stripe_secret_key)
        .expect("failed to build payment client");

    let state = AppState {
        db,
        jwt: JwtSecrets {
            access: config.jwt_access_secret.into(),
            refresh: config.jwt_refresh_secret.into(),
        },
        cookies: CookieSettings {
            domain: config.cookie_domain,
            secure: config.cookie_secure,
        },
        payments,
        payment_currency: config.payment_currency,
    };

    let mut router = build_router(state);
    if let Some(origin) = &config.cors_origin {
        let origin = HeaderValue::from_str(origin).expect("invalid CORS_ORIGIN");
        router = router.layer(cors_layer(origin));
    }

    let http_addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("api listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
