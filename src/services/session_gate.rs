use axum::response::Redirect;
use subtle::ConstantTimeEq;

use crate::models::session::SessionContext;

/// Entry point the gate sends anonymous visitors to.
pub const LOGIN_PATH: &str = "/admin/login";

/// Checks the admin password and marks the session as logged in on success.
///
/// A wrong password leaves `ctx` untouched.
pub fn login(ctx: &mut SessionContext, password: &str, admin_password: &str) -> bool {
    let matches: bool = password.as_bytes().ct_eq(admin_password.as_bytes()).into();
    if matches {
        ctx.logged_in = true;
    }
    matches
}

/// Clears the logged-in flag.
pub fn logout(ctx: &mut SessionContext) {
    ctx.logged_in = false;
}

/// Lets logged-in sessions through and redirects everyone else to the login page.
pub fn require_login(ctx: &SessionContext) -> Result<(), Redirect> {
    if ctx.logged_in {
        Ok(())
    } else {
        Err(Redirect::to(LOGIN_PATH))
    }
}
