//! The desk routes that only need the upstream client, served on an ephemeral port.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_cookies::{CookieManagerLayer, Cookies};

use crate::{
    clients::upstream::UpstreamClient,
    error::Result,
    flash,
    handlers::{
        checkout::{checkout_form, StartCheckoutQuery},
        search::{guardians_page, SEARCH_PATH},
        view::render,
    },
    models::notice::Notice,
};

#[derive(Serialize)]
struct SearchPage {
    notices: Vec<Notice>,
}

async fn search_page(cookies: Cookies) -> Result<Response> {
    render(
        StatusCode::OK,
        &SearchPage {
            notices: flash::take(&cookies),
        },
    )
}

async fn guardians(
    State(upstream): State<UpstreamClient>,
    cookies: Cookies,
    Path(student_id): Path<i64>,
) -> Result<Response> {
    guardians_page(&upstream, &cookies, student_id).await
}

async fn start_checkout(
    State(upstream): State<UpstreamClient>,
    cookies: Cookies,
    Query(query): Query<StartCheckoutQuery>,
) -> Result<Response> {
    checkout_form(&upstream, &cookies, query).await
}

/// Serves the desk routes and returns their base URL.
pub async fn spawn(upstream: UpstreamClient) -> String {
    let app = Router::new()
        .route(SEARCH_PATH, get(search_page))
        .route("/students/{student_id}/guardians", get(guardians))
        .route("/checkouts/new", get(start_checkout))
        .with_state(upstream)
        .layer(CookieManagerLayer::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// A browser-like client: keeps cookies and follows redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}
