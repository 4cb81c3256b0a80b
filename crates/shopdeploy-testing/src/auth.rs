//! Mock auth helpers for integration tests.
//!
//! Mints real access tokens signed with a test secret, so requests go through
//! the same `Identity` extractor as production traffic.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

use shopdeploy_auth_types::token::{JwtClaims, encode_jwt};
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::user::UserRole;

/// Access-token secret shared by test app state and [`MockAuth`].
pub const TEST_ACCESS_SECRET: &str = "test-access-secret";

/// Refresh-token secret for test app state.
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret";

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: UserId,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn customer() -> Self {
        Self::new(UserId::new(), UserRole::Customer)
    }

    pub fn admin() -> Self {
        Self::new(UserId::new(), UserRole::Admin)
    }

    /// Access token valid for one hour, signed with [`TEST_ACCESS_SECRET`].
    pub fn token(&self) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;
        let claims = JwtClaims {
            sub: self.user_id.to_string(),
            role: self.role,
            exp,
            jti: None,
        };
        encode_jwt(&claims, TEST_ACCESS_SECRET).unwrap()
    }

    /// `Authorization: Bearer <token>` value.
    pub fn bearer(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.token())).unwrap()
    }

    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, self.bearer());
        map
    }
}
