//! Authenticated-caller extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use http::request::Parts;
use http::{HeaderMap, StatusCode, header::AUTHORIZATION};

use shopdeploy_core::envelope::error_response;
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::user::UserRole;

use crate::cookie::ACCESS_TOKEN_COOKIE;
use crate::token::validate_access_token;

/// HMAC secret for access tokens. Router state must provide it via `FromRef`.
#[derive(Clone)]
pub struct AccessTokenSecret(pub Arc<str>);

impl AccessTokenSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Caller identity taken from a validated access token.
///
/// The token is read from `Authorization: Bearer <token>` first and the
/// `accessToken` cookie second. Returns 401 when neither is present or the
/// token fails validation. Role enforcement (403) is done by handlers.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "authentication required",
            Self::InvalidToken => "invalid or expired token",
        };
        error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for Identity
where
    AccessTokenSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    // axum-core 0.5 declares `fn -> impl Future + Send`; read everything from
    // `parts` synchronously and hand a 'static future back.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = AccessTokenSecret::from_ref(state);
        let token = bearer_token(&parts.headers).or_else(|| cookie_token(&parts.headers));

        async move {
            let token = token.ok_or(AuthRejection::MissingToken)?;
            let info = validate_access_token(&token, &secret.0).map_err(|e| {
                tracing::debug!(error = %e, "access token rejected");
                AuthRejection::InvalidToken
            })?;
            Ok(Self {
                user_id: info.user_id,
                role: info.role,
            })
        }
    }
}
