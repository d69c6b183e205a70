use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    clients::upstream::UpstreamClient,
    error::Result,
    flash,
    handlers::{search::SEARCH_PATH, view::render},
    models::{notice::Notice, student::StudentSummary},
    services::{checkout as checkout_service, lookup},
    state::AppState,
    validation::checkout::CheckoutRequest,
};

/// Shown when the checkout form is opened without a usable student id.
pub const MISSING_STUDENT_NOTICE: &str = "Please choose a student before starting a checkout.";

/// The query parameters for starting a checkout. `student_id` is parsed by the handler.
#[derive(Deserialize, Debug, Default)]
pub struct StartCheckoutQuery {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
}

#[derive(Serialize)]
struct StartCheckoutView {
    student: StudentSummary,
    guardian_name: Option<String>,
    default_checkout_at: String,
    notices: Vec<Notice>,
}

#[derive(Serialize)]
struct CheckoutCreatedView {
    id: i64,
    notices: Vec<Notice>,
}

/// Prefills the checkout form for a student and guardian.
#[axum::debug_handler]
pub async fn start_checkout(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<StartCheckoutQuery>,
) -> Result<Response> {
    checkout_form(&state.upstream, &cookies, query).await
}

/// Renders the prefilled checkout form, or returns to search with a notice.
pub(crate) async fn checkout_form(
    upstream: &UpstreamClient,
    cookies: &Cookies,
    query: StartCheckoutQuery,
) -> Result<Response> {
    let Some(student_id) = query
        .student_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
    else {
        tracing::warn!("⚠️ Checkout started without a valid student id: {:?}", query.student_id);
        return Ok(flash::redirect(
            cookies,
            Notice::warning(MISSING_STUDENT_NOTICE),
            SEARCH_PATH,
        ));
    };

    let student = match lookup::student_for_checkout(upstream, student_id).await {
        Ok(student) => student,
        Err(notice) => return Ok(flash::redirect(cookies, notice, SEARCH_PATH)),
    };

    let view = StartCheckoutView {
        student,
        guardian_name: query.guardian_name,
        default_checkout_at: Local::now().format("%Y-%m-%dT%H:%M").to_string(),
        notices: flash::take(cookies),
    };
    render(StatusCode::OK, &view)
}

/// Records a checkout.
#[axum::debug_handler]
pub async fn submit_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Response> {
    let (id, checkout) = checkout_service::record_checkout(&state.db, payload).await?;

    let view = CheckoutCreatedView {
        id,
        notices: vec![Notice::success(format!(
            "Checkout of {} recorded successfully!",
            checkout.student_name
        ))],
    };
    render(StatusCode::CREATED, &view)
}
