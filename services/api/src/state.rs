use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use shopdeploy_auth_types::cookie::CookieSettings;
use shopdeploy_auth_types::identity::AccessTokenSecret;

use crate::infra::db::{
    DbCartRepository, DbCategoryRepository, DbOrderRepository, DbProductRepository,
    DbUserRepository,
};
use crate::infra::payment::StripePaymentClient;
use crate::usecase::auth::JwtSecrets;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt: JwtSecrets,
    pub cookies: CookieSettings,
    pub payments: StripePaymentClient,
    pub payment_currency: String,
}

impl FromRef<AppState> for AccessTokenSecret {
    fn from_ref(state: &AppState) -> Self {
        AccessTokenSecret(state.jwt.access.clone())
    }
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    /// Stock lives on the product row.
    pub fn stock_repo(&self) -> DbProductRepository {
        self.product_repo()
    }

    pub fn cart_repo(&self) -> DbCartRepository {
        DbCartRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }
}
