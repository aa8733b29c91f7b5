use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use std::convert::Infallible;

use crate::{db::DbPool, error::AppError};

pub const WINDOW_SECONDS: i64 = 60;
pub const WINDOW_LIMIT: i32 = 100;

/// Counts a request against the client's current fixed window. The counter
/// row lives in the store, so it survives across stateless handler
/// invocations; the upsert resets lapsed windows and increments live ones in
/// one atomic statement.
pub async fn check(pool: &DbPool, client_key: &str) -> Result<(), AppError> {
    let count: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO rate_windows (client_key, window_start, request_count)
        VALUES ($1, now(), 1)
        ON CONFLICT (client_key) DO UPDATE
        SET request_count = CASE
                WHEN rate_windows.window_start < now() - $2 * interval '1 second' THEN 1
                ELSE rate_windows.request_count + 1
            END,
            window_start = CASE
                WHEN rate_windows.window_start < now() - $2 * interval '1 second' THEN now()
                ELSE rate_windows.window_start
            END
        RETURNING request_count
        "#,
    )
    .bind(client_key)
    // float8 * interval resolves directly; bigint * interval does not.
    .bind(WINDOW_SECONDS as f64)
    .fetch_one(pool)
    .await?;

    if count > WINDOW_LIMIT {
        return Err(AppError::RateLimited);
    }
    Ok(())
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// Client identity for rate limiting: the first x-forwarded-for hop when
/// present, otherwise the peer address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let ip = forwarded_for(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(forwarded_for(&headers).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(forwarded_for(&HeaderMap::new()), None);
    }
}
