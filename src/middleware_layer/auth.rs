use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_cookies::Cookies;

use crate::{
    repositories::session as session_repo,
    services::session_gate,
    state::AppState,
};

/// A middleware that only lets logged-in admin sessions through.
///
/// Anonymous callers are redirected to the login entry point.
pub async fn require_login(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking admin session...");

    let ctx = match session_repo::load(&state, &cookies).await {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    if let Err(redirect) = session_gate::require_login(&ctx) {
        tracing::warn!("❌ Admin view requested without login");
        return redirect.into_response();
    }

    next.run(request).await
}
