use chrono::Utc;
use redis::AsyncCommands;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::{SessionContext, StoredSession},
    state::AppState,
};

/// Name of the signed cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

fn redis_key(session_id: &Uuid) -> String {
    format!("session:{}", session_id)
}

/// Creates a secure cookie with the given name, value, and max age.
pub fn create_secure_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(max_age);
    cookie.set_path("/");
    cookie
}

/// Reads the session id from the signed cookie. Tampered cookies are ignored.
fn session_id(state: &AppState, cookies: &Cookies) -> Option<Uuid> {
    cookies
        .signed(&state.cookie_key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Loads the caller's session context. Missing or expired sessions are anonymous.
pub async fn load(state: &AppState, cookies: &Cookies) -> Result<SessionContext> {
    let Some(session_id) = session_id(state, cookies) else {
        return Ok(SessionContext::default());
    };

    let mut redis = state.redis.clone();
    let stored: Option<String> = redis.get(redis_key(&session_id)).await?;

    let Some(json) = stored else {
        tracing::debug!("🔑 Session {} not found", session_id);
        return Ok(SessionContext::default());
    };

    let session: StoredSession = match sonic_rs::from_str(&json) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("❌ Invalid session JSON for {}: {}", session_id, e);
            return Ok(SessionContext::default());
        }
    };

    if Utc::now() > session.expires_at {
        tracing::warn!("❌ Session {} expired", session_id);
        let _: () = redis.del(redis_key(&session_id)).await.unwrap_or(());
        return Ok(SessionContext::default());
    }

    Ok(session.context)
}

/// Persists `ctx` for the caller, issuing a fresh session id and cookie.
pub async fn save(state: &AppState, cookies: &Cookies, ctx: SessionContext) -> Result<()> {
    if let Some(previous) = session_id(state, cookies) {
        let mut redis = state.redis.clone();
        let _: () = redis.del(redis_key(&previous)).await.unwrap_or(());
    }

    let session_id = Uuid::new_v4();
    let days = state.config.session_duration_days;
    let now = Utc::now();
    let session = StoredSession {
        context: ctx,
        created_at: now,
        expires_at: now + chrono::Duration::days(days),
    };

    let json = sonic_rs::to_string(&session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    let mut redis = state.redis.clone();
    let _: () = redis
        .set_ex(redis_key(&session_id), &json, (days * 86400) as u64)
        .await
        .map_err(|e| {
            tracing::error!("❌ Redis set_ex failed: {}", e);
            AppError::Redis(e)
        })?;

    cookies.signed(&state.cookie_key).add(create_secure_cookie(
        SESSION_COOKIE,
        session_id.to_string(),
        Duration::days(days),
        state.config.secure_cookies,
    ));

    tracing::info!("✅ Session saved: session:{}", session_id);
    Ok(())
}

/// Deletes the caller's session and its cookie.
pub async fn destroy(state: &AppState, cookies: &Cookies) -> Result<()> {
    if let Some(session_id) = session_id(state, cookies) {
        let mut redis = state.redis.clone();
        let _: () = redis.del(redis_key(&session_id)).await?;
        tracing::info!("✅ Session deleted: session:{}", session_id);
    }

    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.remove(cookie);
    Ok(())
}
