//! Central configuration for the console_session crate

use std::sync::LazyLock;

/// Base URL of the back-office REST API (login, verification, settings).
pub static API_BASE_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
});

/// Origin serving the cookie-authenticated token refresh endpoint.
///
/// Renewal is authenticated by an ambient cookie scoped to this origin, not
/// by the expiring access token.
pub static ORIGIN: LazyLock<String> = LazyLock::new(|| {
    std::env::var("ORIGIN").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
});

/// Brand whose security settings size the fallback session length.
pub static BRAND_ID: LazyLock<String> =
    LazyLock::new(|| std::env::var("BRAND_ID").unwrap_or_else(|_| "1".to_string()));
