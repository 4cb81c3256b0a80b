/// API service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ApiConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server (default 5000). Env var: `API_PORT`.
    pub api_port: u16,
    /// HMAC secret for access tokens. Env var: `JWT_ACCESS_SECRET`.
    pub jwt_access_secret: String,
    /// HMAC secret for refresh tokens. Env var: `JWT_REFRESH_SECRET`.
    pub jwt_refresh_secret: String,
    /// Cookie `Domain` attribute; host-only cookies when unset. Env var: `COOKIE_DOMAIN`.
    pub cookie_domain: Option<String>,
    /// Mark auth cookies `Secure` (default true). Env var: `COOKIE_SECURE`.
    pub cookie_secure: bool,
    /// Allowed browser origin for CORS with credentials. Env var: `CORS_ORIGIN`.
    pub cors_origin: Option<String>,
    /// Stripe secret key; online payments fail when unset. Env var: `STRIPE_SECRET_KEY`.
    pub stripe_secret_key: Option<String>,
    /// Env var: `STRIPE_API_BASE` (default `https://api.stripe.com`).
    pub stripe_api_base: String,
    /// ISO currency code for payment intents (default `inr`). Env var: `PAYMENT_CURRENCY`.
    pub payment_currency: String,
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            jwt_access_secret: std::env::var("JWT_ACCESS_SECRET").expect("JWT_ACCESS_SECRET"),
            jwt_refresh_secret: std::env::var("JWT_REFRESH_SECRET").expect("JWT_REFRESH_SECRET"),
            cookie_domain: optional("COOKIE_DOMAIN"),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            cors_origin: optional("CORS_ORIGIN"),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            stripe_api_base: optional("STRIPE_API_BASE")
                .unwrap_or_else(|| "https://api.stripe.com".to_owned()),
            payment_currency: optional("PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| "inr".to_owned()),
        }
    }
}
