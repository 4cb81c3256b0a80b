use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use uuid::Uuid;

use shopdeploy_auth_types::cookie::{ACCESS_TOKEN_EXP, REFRESH_TOKEN_EXP};
use shopdeploy_auth_types::token::{JwtClaims, decode_jwt, encode_jwt};
use shopdeploy_domain::id::UserId;
use shopdeploy_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{
    SavedAddress, User, normalize_email, validate_email, validate_password, MIN_PASSWORD_LEN,
};
use crate::error::ApiError;

/// HMAC secrets for the two token kinds.
#[derive(Clone)]
pub struct JwtSecrets {
    pub access: Arc<str>,
    pub refresh: Arc<str>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub fn issue_access_token(user: &User, secret: &str) -> Result<(String, u64), ApiError> {
    let exp = now_secs() + ACCESS_TOKEN_EXP;
    let claims = JwtClaims {
        sub: user.id.to_string(),
        role: user.role,
        exp,
        jti: None,
    };
    let token = encode_jwt(&claims, secret).context("failed to sign access token")?;
    Ok((token, exp))
}

/// Refresh tokens carry a random `jti` so two issued in the same second still differ.
pub fn issue_refresh_token(user: &User, secret: &str) -> Result<String, ApiError> {
    let claims = JwtClaims {
        sub: user.id.to_string(),
        role: user.role,
        exp: now_secs() + REFRESH_TOKEN_EXP,
        jti: Some(Uuid::new_v4().to_string()),
    };
    Ok(encode_jwt(&claims, secret).context("failed to sign refresh token")?)
}

/// Signature and expiry check only; the caller compares against the stored session.
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<UserId, ApiError> {
    let claims = decode_jwt(token, secret).map_err(|_| ApiError::InvalidRefreshToken)?;
    claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::InvalidRefreshToken)
}

// ── Password hashing ─────────────────────────────────────────────────────────

/// Argon2id PHC string. Runs on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| anyhow::anyhow!("argon2 hash failed: {e}"))
    })
    .await
    .context("password hashing task panicked")??;
    Ok(hash)
}

/// `false` for a wrong password; a corrupt stored hash is an internal error.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let ok = tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;
        Ok::<_, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .context("password verify task panicked")??;
    Ok(ok)
}

// ── Session issuing ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AuthOutput {
    pub user: User,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

/// Issue a token pair and make the refresh token the user's only valid session.
async fn start_session<U: UserRepository>(
    users: &U,
    secrets: &JwtSecrets,
    mut user: User,
) -> Result<AuthOutput, ApiError> {
    let (access_token, access_token_exp) = issue_access_token(&user, &secrets.access)?;
    let refresh_token = issue_refresh_token(&user, &secrets.refresh)?;
    users
        .set_refresh_token(user.id, Some(&refresh_token))
        .await?;
    user.refresh_token = Some(refresh_token.clone());
    Ok(AuthOutput {
        user,
        access_token,
        access_token_exp,
        refresh_token,
    })
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U: UserRepository> {
    pub users: U,
    pub secrets: JwtSecrets,
}

impl<U: UserRepository> RegisterUseCase<U> {
    pub async fn execute(&self, input: RegisterInput) -> Result<AuthOutput, ApiError> {
        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(ApiError::validation("name is required"));
        }
        let email = normalize_email(&input.email);
        if !validate_email(&email) {
            return Err(ApiError::validation("email is invalid"));
        }
        if !validate_password(&input.password) {
            return Err(ApiError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name,
            email,
            password_hash: hash_password(input.password).await?,
            role: UserRole::Customer,
            addresses: Vec::new(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "user registered");

        start_session(&self.users, &self.secrets, user).await
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub struct LoginUseCase<U: UserRepository> {
    pub users: U,
    pub secrets: JwtSecrets,
}

impl<U: UserRepository> LoginUseCase<U> {
    /// Unknown email and wrong password fail identically.
    pub async fn execute(&self, input: LoginInput) -> Result<AuthOutput, ApiError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }
        let email = normalize_email(&input.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        if !verify_password(input.password, user.password_hash.clone()).await? {
            return Err(ApiError::InvalidCredentials);
        }
        start_session(&self.users, &self.secrets, user).await
    }
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

pub struct RefreshTokenUseCase<U: UserRepository> {
    pub users: U,
    pub secrets: JwtSecrets,
}

impl<U: UserRepository> RefreshTokenUseCase<U> {
    /// Rotate the session. The presented token must be the one currently stored.
    pub async fn execute(&self, presented: &str) -> Result<AuthOutput, ApiError> {
        let user_id = validate_refresh_token(presented, &self.secrets.refresh)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::InvalidRefreshToken)?;
        if user.refresh_token.as_deref() != Some(presented) {
            return Err(ApiError::InvalidRefreshToken);
        }
        start_session(&self.users, &self.secrets, user).await
    }
}

// ── Logout ───────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> LogoutUseCase<U> {
    pub async fn execute(&self, user_id: UserId) -> Result<(), ApiError> {
        self.users.set_refresh_token(user_id, None).await
    }
}

// ── GetMe ────────────────────────────────────────────────────────────────────

pub struct GetMeUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetMeUseCase<U> {
    pub async fn execute(&self, user_id: UserId) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── ReplaceAddresses ─────────────────────────────────────────────────────────

pub struct ReplaceAddressesUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ReplaceAddressesUseCase<U> {
    pub async fn execute(
        &self,
        user_id: UserId,
        addresses: Vec<SavedAddress>,
    ) -> Result<User, ApiError> {
        for (i, saved) in addresses.iter().enumerate() {
            if let Some(field) = saved.address.first_missing_field() {
                return Err(ApiError::validation(format!(
                    "addresses[{i}].{field} is required"
                )));
            }
        }
        if addresses.iter().filter(|a| a.is_default).count() > 1 {
            return Err(ApiError::validation("only one address can be default"));
        }

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        self.users.replace_addresses(user_id, &addresses).await?;
        user.addresses = addresses;
        user.updated_at = Utc::now();
        Ok(user)
    }
}
