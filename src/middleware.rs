//! Security headers interceptor.
//!
//! Token responses must never be cached or sniffed, so every route runs
//! through this interceptor as the outermost link of its chain.

use crate::chain::{Endpoint, Interceptor};
use axum::http::HeaderValue;

/// Interceptor that adds security headers to every response it wraps.
///
/// - **Cache-Control: no-store** keeps issued tokens out of shared and
///   browser caches.
/// - **X-Content-Type-Options: nosniff** forces clients to respect the
///   declared Content-Type.
/// - **X-Frame-Options: DENY** and `frame-ancestors 'none'` disallow framing.
/// - **Referrer-Policy: no-referrer**
///
/// # Usage
///
/// ```rust,no_run
/// use gauther::chain::{compose, Endpoint};
/// use gauther::middleware::security_headers;
///
/// # fn wrap(endpoint: Endpoint) -> Endpoint {
/// compose(endpoint, &[security_headers()])
/// # }
/// ```
pub fn security_headers() -> Interceptor {
    Interceptor::from_fn(|request, next: Endpoint| async move {
        let mut response = next.call(request).await;
        let headers = response.headers_mut();

        headers.insert("cache-control", HeaderValue::from_static("no-store"));
        headers.insert("pragma", HeaderValue::from_static("no-cache"));
        headers.insert(
            "x-content-type-options",
            HeaderValue::from_static("nosniff"),
        );
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );

        response
    })
}
