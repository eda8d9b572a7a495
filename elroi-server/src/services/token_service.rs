use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

use elroi_shared::errors::{AppError, AppResult};
use elroi_shared::types::auth::{AccessToken, AuthUser, Claims};

use crate::models::NewRevokedToken;
use crate::schema::revoked_tokens;

pub fn create_access_token(user_id: i32, secret: &str, ttl_secs: i64) -> Result<AccessToken, AppError> {
    let claims = Claims::new(user_id, ttl_secs);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("JWT encoding failed: {e}")))?;

    Ok(AccessToken::bearer(token, ttl_secs))
}

/// Records the token as revoked until its natural expiry and drops
/// revocations whose tokens have expired anyway.
pub fn revoke(conn: &mut SqliteConnection, user: &AuthUser) -> AppResult<()> {
    let now = Utc::now().naive_utc();
    let expires_at = DateTime::from_timestamp(user.expires_at, 0)
        .map(|d| d.naive_utc())
        .unwrap_or(now);

    diesel::delete(revoked_tokens::table.filter(revoked_tokens::expires_at.lt(now)))
        .execute(conn)?;

    diesel::insert_or_ignore_into(revoked_tokens::table)
        .values(&NewRevokedToken {
            jti: user.token_id.to_string(),
            revoked_at: now,
            expires_at,
        })
        .execute(conn)?;

    tracing::info!(user_id = user.id, token_id = %user.token_id, "token revoked");
    Ok(())
}

pub fn is_revoked(conn: &mut SqliteConnection, token_id: Uuid) -> AppResult<bool> {
    let revoked = diesel::select(diesel::dsl::exists(
        revoked_tokens::table.filter(revoked_tokens::jti.eq(token_id.to_string())),
    ))
    .get_result::<bool>(conn)?;
    Ok(revoked)
}
