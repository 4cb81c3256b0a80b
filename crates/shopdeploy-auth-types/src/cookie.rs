//! Cookie builders for access and refresh tokens.
//!
//! Both cookies are HttpOnly with `SameSite=Strict`; `Secure` and `Domain`
//! come from [`CookieSettings`] so local HTTP development keeps working.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie name for the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Access-token JWT lifetime and cookie Max-Age in seconds (15 minutes).
pub const ACCESS_TOKEN_EXP: u64 = 900;

/// Refresh-token JWT lifetime and cookie Max-Age in seconds (7 days).
pub const REFRESH_TOKEN_EXP: u64 = 604800;

/// Deployment-dependent cookie attributes.
#[derive(Debug, Clone, Default)]
pub struct CookieSettings {
    /// `Domain` attribute; host-only cookie when `None`.
    pub domain: Option<String>,
    pub secure: bool,
}

fn token_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    settings: &CookieSettings,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Strict);
    if let Some(domain) = &settings.domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}

/// Set the access-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::{CookieJar, SameSite};
/// use shopdeploy_auth_types::cookie::{set_access_token_cookie, CookieSettings, ACCESS_TOKEN_COOKIE};
///
/// let settings = CookieSettings { domain: Some("example.com".into()), secure: true };
/// let jar = set_access_token_cookie(CookieJar::new(), "token_value".to_string(), &settings);
/// let cookie = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(900)));
/// assert_eq!(cookie.same_site(), Some(SameSite::Strict));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_access_token_cookie(jar: CookieJar, value: String, settings: &CookieSettings) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        value,
        Duration::seconds(ACCESS_TOKEN_EXP as i64),
        settings,
    ))
}

/// Set the refresh-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use shopdeploy_auth_types::cookie::{set_refresh_token_cookie, CookieSettings, REFRESH_TOKEN_COOKIE};
///
/// let jar = set_refresh_token_cookie(CookieJar::new(), "refresh_value".to_string(), &CookieSettings::default());
/// let cookie = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.domain(), None);
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
/// assert!(!cookie.secure().unwrap_or(false));
/// ```
pub fn set_refresh_token_cookie(jar: CookieJar, value: String, settings: &CookieSettings) -> CookieJar {
    jar.add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        value,
        Duration::seconds(REFRESH_TOKEN_EXP as i64),
        settings,
    ))
}

/// Clear both token cookies by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use shopdeploy_auth_types::cookie::{
///     clear_cookies, set_access_token_cookie, set_refresh_token_cookie, CookieSettings,
///     ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
/// };
///
/// let settings = CookieSettings::default();
/// let jar = set_access_token_cookie(CookieJar::new(), "a".to_string(), &settings);
/// let jar = set_refresh_token_cookie(jar, "r".to_string(), &settings);
/// let jar = clear_cookies(jar, &settings);
/// assert_eq!(jar.get(ACCESS_TOKEN_COOKIE).unwrap().max_age(), Some(time::Duration::ZERO));
/// assert_eq!(jar.get(REFRESH_TOKEN_COOKIE).unwrap().max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_cookies(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        String::new(),
        Duration::ZERO,
        settings,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        String::new(),
        Duration::ZERO,
        settings,
    ))
}
