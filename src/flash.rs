use axum::response::{IntoResponse, Redirect, Response};
use base64::{engine::general_purpose, Engine as _};
use tower_cookies::{cookie::time::Duration, Cookie, Cookies};

use crate::models::notice::Notice;

/// Name of the cookie holding notices queued across a redirect.
pub const FLASH_COOKIE: &str = "flash";

fn decode(value: &str) -> Vec<Notice> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| sonic_rs::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn encode(notices: &[Notice]) -> Option<String> {
    sonic_rs::to_vec(notices)
        .ok()
        .map(|bytes| general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Queues a notice for the next rendered view.
pub fn push(cookies: &Cookies, notice: Notice) {
    let mut notices = cookies
        .get(FLASH_COOKIE)
        .map(|c| decode(c.value()))
        .unwrap_or_default();
    notices.push(notice);

    let Some(value) = encode(&notices) else {
        tracing::warn!("⚠️ Could not encode flash notices");
        return;
    };

    let mut cookie = Cookie::new(FLASH_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(Duration::minutes(5));
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookies.add(cookie);
}

/// Queues `notice` and redirects (303) to `location`, where it will be shown.
pub fn redirect(cookies: &Cookies, notice: Notice, location: &str) -> Response {
    push(cookies, notice);
    Redirect::to(location).into_response()
}

/// Drains queued notices.
pub fn take(cookies: &Cookies) -> Vec<Notice> {
    let Some(cookie) = cookies.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    let notices = decode(cookie.value());

    let mut expired = Cookie::new(FLASH_COOKIE, "");
    expired.set_path("/");
    cookies.remove(expired);

    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_survive_encoding() {
        let notices = vec![
            Notice::danger("Authentication error."),
            Notice::info("No students found matching \"Zé\"."),
        ];
        let encoded = encode(&notices).unwrap();
        assert_eq!(decode(&encoded), notices);
    }

    #[test]
    fn test_garbage_cookie_yields_no_notices() {
        assert!(decode("%%%not-base64").is_empty());
        assert!(decode("bm90IGpzb24").is_empty());
    }
}
