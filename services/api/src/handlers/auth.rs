use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdeploy_auth_types::cookie::{
    REFRESH_TOKEN_COOKIE, clear_cookies, set_access_token_cookie, set_refresh_token_cookie,
};
use shopdeploy_auth_types::identity::Identity;
use shopdeploy_core::envelope::Envelope;
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::user::UserRole;

use crate::domain::types::{SavedAddress, User};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;
use crate::usecase::auth::{
    AuthOutput, GetMeUseCase, LoginInput, LoginUseCase, LogoutUseCase, RefreshTokenUseCase,
    RegisterInput, RegisterUseCase, ReplaceAddressesUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

/// Public view of an account; never carries the password hash or refresh token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub addresses: Vec<SavedAddress>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "shopdeploy_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            addresses: user.addresses,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Put both tokens in cookies and build the body carrying them too.
fn session_response(
    state: &AppState,
    jar: CookieJar,
    out: AuthOutput,
) -> (CookieJar, AuthResponse) {
    let jar = set_access_token_cookie(jar, out.access_token.clone(), &state.cookies);
    let jar = set_refresh_token_cookie(jar, out.refresh_token.clone(), &state.cookies);
    let body = AuthResponse {
        user: out.user.into(),
        access_token: out.access_token,
        access_token_exp: out.access_token_exp,
        refresh_token: out.refresh_token,
    };
    (jar, body)
}

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        secrets: state.jwt.clone(),
    };
    let out = usecase
        .execute(RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;
    let (jar, body) = session_response(&state, jar, out);
    Ok((jar, Envelope::created("User registered successfully", body)))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        secrets: state.jwt.clone(),
    };
    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    let (jar, body) = session_response(&state, jar, out);
    Ok((jar, Envelope::ok("Login successful", body)))
}

// ── POST /auth/refresh-token ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

/// Accepts the token in the JSON body or, failing that, the `refreshToken` cookie.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: RefreshTokenRequest = if body.is_empty() {
        RefreshTokenRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("invalid JSON body: {e}")))?
    };
    let presented = request
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| {
            jar.get(REFRESH_TOKEN_COOKIE)
                .map(|c| c.value().to_owned())
                .filter(|t| !t.is_empty())
        })
        .ok_or(ApiError::InvalidRefreshToken)?;

    let usecase = RefreshTokenUseCase {
        users: state.user_repo(),
        secrets: state.jwt.clone(),
    };
    let out = usecase.execute(&presented).await?;
    let (jar, body) = session_response(&state, jar, out);
    Ok((jar, Envelope::ok("Token refreshed", body)))
}

// ── POST /auth/logout ────────────────────────────────────────────────────────

pub async fn logout(
    identity: Identity,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = LogoutUseCase {
        users: state.user_repo(),
    };
    usecase.execute(identity.user_id).await?;
    let jar = clear_cookies(jar, &state.cookies);
    Ok((jar, Envelope::message("Logged out successfully")))
}

// ── GET /auth/me ─────────────────────────────────────────────────────────────

pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Envelope<UserResponse>, ApiError> {
    let usecase = GetMeUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id).await?;
    Ok(Envelope::ok("User fetched", user.into()))
}

// ── PUT /auth/me/addresses ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReplaceAddressesRequest {
    pub addresses: Vec<SavedAddress>,
}

pub async fn replace_addresses(
    identity: Identity,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ReplaceAddressesRequest>,
) -> Result<Envelope<UserResponse>, ApiError> {
    let usecase = ReplaceAddressesUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.user_id, body.addresses).await?;
    Ok(Envelope::ok("Addresses updated", user.into()))
}
