use axum::{
    Router,
    routing::{get, post},
    middleware::from_fn_with_state,
};

use tower_cookies::CookieManagerLayer;
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod flash;

mod clients {
    pub mod upstream;
}

mod models {
    pub mod checkout;
    pub mod notice;
    pub mod session;
    pub mod student;
}

mod repositories {
    pub mod checkout;
    pub mod session;
}

mod services {
    pub mod checkout;
    pub mod lookup;
    pub mod session_gate;
}

mod handlers {
    pub mod admin;
    pub mod checkout;
    pub mod search;
    pub mod view;
    #[cfg(test)]
    pub mod test_support;
}

mod middleware_layer {
    pub mod auth;
}

mod validation {
    pub mod checkout;
}

use config::Config;
use state::AppState;

/// Builds the router for every desk and admin route.
fn router(state: AppState) -> Router {
    let desk_routes = Router::new()
        .route("/", get(handlers::search::index))
        .route("/search", post(handlers::search::search))
        .route(
            "/students/{student_id}/guardians",
            get(handlers::search::guardian_details),
        )
        .route("/checkouts/new", get(handlers::checkout::start_checkout))
        .route("/checkouts", post(handlers::checkout::submit_checkout))
        .route("/health", get(|| async { "ok" }))
        .with_state(state.clone());

    let login_routes = Router::new()
        .route(
            "/admin/login",
            get(handlers::admin::login_page).post(handlers::admin::login),
        )
        .route("/admin/logout", post(handlers::admin::logout))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/admin", get(handlers::admin::dashboard))
        .route("/admin/history", get(handlers::admin::history))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_login,
        ))
        .with_state(state);

    Router::new()
        .merge(desk_routes)
        .merge(login_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let app = router(state);

    let addr = config.bind_addr;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
