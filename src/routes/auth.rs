use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use diesel::prelude::*;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    config::AppConfig,
    error::{AppError, AppResult},
    models::{NewRefreshToken, RefreshToken, User},
    schema::{refresh_tokens, users},
    state::AppState,
};

const REFRESH_COOKIE_NAME: &str = "refresh_token";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// A freshly minted access token plus the refresh token backing it. The
/// refresh value leaves the server exactly once, inside the cookie; only its
/// hash is stored.
struct Session {
    access_token: String,
    refresh_value: String,
    refresh_expires: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let mut conn = state.db()?;

    let user: User = users::table
        .filter(users::email.eq(&payload.email))
        .filter(users::is_active.eq(true))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    if !password::verify_password(&payload.password, &user.password_hash).unwrap_or(false) {
        return Err(AppError::unauthorized());
    }

    let session = open_session(&mut conn, &state, &user)?;
    session_response(&state, session)
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let presented = presented_refresh_value(&jar).ok_or_else(AppError::unauthorized)?;

    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let token: RefreshToken = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(sha256_hex(&presented)))
        .filter(refresh_tokens::revoked_at.is_null())
        .filter(refresh_tokens::expires_at.gt(now))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    // Rotation: the presented token is dead from here on, even if issuing
    // the replacement fails.
    revoke_tokens(&mut conn, token.user_id, Some(token.token_hash.as_str()), now)?;

    let user: User = users::table
        .find(token.user_id)
        .filter(users::is_active.eq(true))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    let session = open_session(&mut conn, &state, &user)?;
    session_response(&state, session)
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, StatusCode)> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let revoked = match presented_refresh_value(&jar) {
        Some(value) => {
            revoke_tokens(&mut conn, user.user_id, Some(sha256_hex(&value).as_str()), now)?
        }
        None => 0,
    };

    // Without a matching cookie, fall back to ending every live session for
    // the account.
    if revoked == 0 {
        revoke_tokens(&mut conn, user.user_id, None, now)?;
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, refresh_cookie(&state.config, None)?);
    Ok((headers, StatusCode::NO_CONTENT))
}

pub async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

fn open_session(conn: &mut PgConnection, state: &AppState, user: &User) -> AppResult<Session> {
    let access_token = state
        .jwt
        .generate_token(user.id, &user.email, &user.role)?;

    let now = Utc::now();
    let refresh_value = random_hex_token();
    let refresh_expires = now + ChronoDuration::days(state.config.refresh_token_expiry_days);

    diesel::insert_into(refresh_tokens::table)
        .values(&NewRefreshToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: sha256_hex(&refresh_value),
            issued_at: now.naive_utc(),
            expires_at: refresh_expires.naive_utc(),
        })
        .execute(conn)?;

    Ok(Session {
        access_token,
        refresh_value,
        refresh_expires,
    })
}

fn session_response(
    state: &AppState,
    session: Session,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        refresh_cookie(
            &state.config,
            Some((&session.refresh_value, session.refresh_expires)),
        )?,
    );

    Ok((
        headers,
        Json(LoginResponse {
            access_token: session.access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiry_minutes * 60,
        }),
    ))
}

/// Revokes the user's live refresh tokens: one specific token when a hash is
/// given, every outstanding one otherwise.
fn revoke_tokens(
    conn: &mut PgConnection,
    user_id: Uuid,
    token_hash: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<usize> {
    let stamp = (
        refresh_tokens::revoked_at.eq(now),
        refresh_tokens::updated_at.eq(now),
    );
    let scope = refresh_tokens::table
        .filter(refresh_tokens::user_id.eq(user_id))
        .filter(refresh_tokens::revoked_at.is_null());

    let updated = match token_hash {
        Some(hash) => diesel::update(scope.filter(refresh_tokens::token_hash.eq(hash)))
            .set(stamp)
            .execute(conn)?,
        None => diesel::update(scope).set(stamp).execute(conn)?,
    };
    Ok(updated)
}

fn presented_refresh_value(jar: &Option<TypedHeader<Cookie>>) -> Option<String> {
    jar.as_ref()?.get(REFRESH_COOKIE_NAME).map(str::to_string)
}

/// Builds the Set-Cookie header for the refresh token; `None` clears it.
fn refresh_cookie(
    config: &AppConfig,
    session: Option<(&str, DateTime<Utc>)>,
) -> AppResult<HeaderValue> {
    let mut cookie = match session {
        Some((value, expires_at)) => {
            let max_age = ChronoDuration::days(config.refresh_token_expiry_days).num_seconds();
            format!(
                "{REFRESH_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Strict; \
                 Max-Age={max_age}; Expires={}",
                expires_at.to_rfc2822()
            )
        }
        None => format!(
            "{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; \
             Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        ),
    };

    if config.refresh_cookie_secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &config.refresh_cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }

    HeaderValue::from_str(&cookie).map_err(AppError::internal)
}

fn sha256_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn random_hex_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
