use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const ROLE_SELLER: &str = "seller";
pub const ROLE_ADMIN: &str = "admin";

/// Issued tokens expire after one hour.
pub const TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn issue_token(user_id: Uuid, role: &str, secret: &str) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::seconds(TOKEN_TTL_SECONDS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("failed to set token expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Pure verification: no I/O, fails closed. The default validation accepts
/// HS256 only and checks `exp`, so tokens signed with another algorithm or
/// key are rejected alongside expired and malformed ones.
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthorized("token is empty".to_string()));
    }

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("token expired".to_string()),
        _ => AppError::Unauthorized("invalid token".to_string()),
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid user id in token".to_string()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

/// Create requires a selling role; the ownership check is separate.
pub fn ensure_seller_or_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role == ROLE_SELLER || user.role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::Forbidden("forbidden: seller role required"))
    }
}

/// Update/delete require the caller to own the row; admins bypass the
/// ownership check.
pub fn ensure_owner(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id == owner_id || user.role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::Forbidden("forbidden: not the product owner"))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("invalid Authorization header".to_string()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized(
                "invalid Authorization scheme".to_string(),
            ));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        verify_token(token, &secret)
    }
}
