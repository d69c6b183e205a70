use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    clients::upstream::UpstreamClient,
    error::Result,
    flash,
    handlers::view::render,
    models::{
        notice::Notice,
        session::SessionContext,
        student::{AuthorizedGuardian, StudentSummary},
    },
    repositories::session as session_repo,
    services::lookup,
    state::AppState,
};

/// Path of the search view.
pub const SEARCH_PATH: &str = "/";

/// The request payload for a student search.
#[derive(Deserialize, Debug)]
pub struct SearchRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
struct SearchView<'a> {
    students: &'a [StudentSummary],
    notices: Vec<Notice>,
    logged_in: bool,
}

#[derive(Serialize)]
struct GuardiansView<'a> {
    student_id: i64,
    authorized: &'a [AuthorizedGuardian],
    notices: Vec<Notice>,
}

/// The search view only shows whether an admin is logged in, so a session
/// store outage degrades to "not logged in".
async fn logged_in(state: &AppState, cookies: &Cookies) -> bool {
    match session_repo::load(state, cookies).await {
        Ok(SessionContext { logged_in }) => logged_in,
        Err(e) => {
            tracing::warn!("⚠️ Session lookup failed: {}", e);
            false
        }
    }
}

/// Renders the empty search view with any pending notices.
#[axum::debug_handler]
pub async fn index(State(state): State<AppState>, cookies: Cookies) -> Result<Response> {
    let view = SearchView {
        students: &[],
        notices: flash::take(&cookies),
        logged_in: logged_in(&state, &cookies).await,
    };
    render(StatusCode::OK, &view)
}

/// Searches students by name.
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SearchRequest>,
) -> Result<Response> {
    tracing::info!("🔍 Student search: {:?}", payload.name);

    let result = lookup::search_students(&state.upstream, &payload.name).await;

    let mut notices = flash::take(&cookies);
    notices.extend(result.notices);

    let view = SearchView {
        students: &result.data,
        notices,
        logged_in: logged_in(&state, &cookies).await,
    };
    render(StatusCode::OK, &view)
}

/// Lists the guardians authorized to pick up a student.
#[axum::debug_handler]
pub async fn guardian_details(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(student_id): Path<i64>,
) -> Result<Response> {
    guardians_page(&state.upstream, &cookies, student_id).await
}

/// Renders the guardian view, or returns to search when the upstream login fails.
pub(crate) async fn guardians_page(
    upstream: &UpstreamClient,
    cookies: &Cookies,
    student_id: i64,
) -> Result<Response> {
    tracing::info!("👪 Guardian lookup for student {}", student_id);

    match lookup::authorized_guardians(upstream, student_id).await {
        Ok(result) => {
            let mut notices = flash::take(cookies);
            notices.extend(result.notices);

            let view = GuardiansView {
                student_id,
                authorized: &result.data,
                notices,
            };
            render(StatusCode::OK, &view)
        }
        Err(notice) => Ok(flash::redirect(cookies, notice, SEARCH_PATH)),
    }
}
