use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    error::Result,
    flash,
    handlers::{search::SEARCH_PATH, view::render},
    models::{checkout::CheckoutRecord, notice::Notice},
    repositories::{checkout as checkout_repo, session as session_repo},
    services::{checkout as checkout_service, session_gate},
    state::AppState,
    validation::checkout::HistoryQuery,
};

/// Path of the admin dashboard.
pub const ADMIN_PATH: &str = "/admin";

/// The request payload for admin login.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
struct LoginView {
    logged_in: bool,
    notices: Vec<Notice>,
}

#[derive(Serialize)]
struct DashboardView {
    checkout_count: i64,
    notices: Vec<Notice>,
}

#[derive(Serialize)]
struct HistoryView<'a> {
    records: &'a [CheckoutRecord],
    student_name: Option<String>,
    date: Option<String>,
    notices: Vec<Notice>,
}

/// Renders the login entry point.
#[axum::debug_handler]
pub async fn login_page(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let ctx = session_repo::load(&state, &cookies).await?;
    let view = LoginView {
        logged_in: ctx.logged_in,
        notices: flash::take(&cookies),
    };
    render(StatusCode::OK, &view)
}

/// Handles admin login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let mut ctx = session_repo::load(&state, &cookies).await?;

    if !session_gate::login(&mut ctx, &payload.password, &state.config.admin_password) {
        tracing::warn!("❌ Admin login failed: incorrect password");
        let view = LoginView {
            logged_in: ctx.logged_in,
            notices: vec![Notice::danger("Incorrect password. Please try again.")],
        };
        return render(StatusCode::UNAUTHORIZED, &view);
    }

    session_repo::save(&state, &cookies, ctx).await?;
    tracing::info!("✅ Admin logged in");

    Ok(Redirect::to(ADMIN_PATH).into_response())
}

/// Handles admin logout.
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let mut ctx = session_repo::load(&state, &cookies).await?;
    session_gate::logout(&mut ctx);
    session_repo::destroy(&state, &cookies).await?;

    tracing::info!("👋 Admin logged out");

    Ok(flash::redirect(
        &cookies,
        Notice::info("You have been logged out."),
        SEARCH_PATH,
    ))
}

/// Renders the admin dashboard.
#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let view = DashboardView {
        checkout_count: checkout_repo::count(&state.db).await?,
        notices: flash::take(&cookies),
    };
    render(StatusCode::OK, &view)
}

/// Lists the checkout history, optionally filtered by student name and date.
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<HistoryQuery>,
) -> Result<Response> {
    let student_name = query.student_name.clone();
    let date = query.date.clone();
    let records = checkout_service::history(&state.db, query).await?;

    let view = HistoryView {
        records: &records,
        student_name,
        date,
        notices: flash::take(&cookies),
    };
    render(StatusCode::OK, &view)
}
