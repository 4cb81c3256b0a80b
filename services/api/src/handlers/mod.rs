pub mod auth;
pub mod cart;
pub mod category;
pub mod health;
pub mod order;
pub mod product;

use shopdeploy_auth_types::identity::Identity;

use crate::error::ApiError;

/// 403 unless the caller is an admin.
pub(crate) fn require_admin(identity: &Identity) -> Result<(), ApiError> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
