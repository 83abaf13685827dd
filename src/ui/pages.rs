//! Standalone pages outside the dashboard chrome.

use super::layout::{error_banner, escape, html_shell};
use crate::access::View;
use crate::session::Role;

/// Seconds the unauthorized notice stays up before moving on.
const FORBIDDEN_NOTICE_SECS: u32 = 3;

/// Login form. `from` is carried through a hidden field.
#[must_use]
pub fn login_page(error: Option<&str>, from: Option<&str>, username: &str) -> String {
    let from_field = from
        .map(|from| {
            format!(
                r#"<input type="hidden" name="from" value="{}">"#,
                escape(from)
            )
        })
        .unwrap_or_default();

    let content = format!(
        r#"<div class="flex min-h-screen items-center justify-center">
    <form method="post" action="/login" class="login-card w-full max-w-sm p-8 rounded-3xl bg-surface shadow-lg space-y-4">
        <h1 class="text-2xl font-bold">Admin Login</h1>
        {error}
        {from_field}
        <label class="block">
            <span class="text-sm">Username</span>
            <input type="text" name="username" value="{username}" required autofocus class="input w-full">
        </label>
        <label class="block">
            <span class="text-sm">Password</span>
            <input type="password" name="password" required class="input w-full">
        </label>
        <button type="submit" class="btn btn-primary w-full">Login</button>
    </form>
</div>"#,
        error = error_banner(error),
        username = escape(username),
    );
    html_shell("Login", "", &content)
}

/// Neutral placeholder while the session is still being restored.
#[must_use]
pub fn loading_page(path: &str) -> String {
    let head = format!(
        r#"<meta http-equiv="refresh" content="1;url={}">"#,
        escape(path)
    );
    html_shell(
        "Loading",
        &head,
        r#"<div class="flex min-h-screen items-center justify-center"><p>Loading...</p></div>"#,
    )
}

/// Shown when a signed-in operator opens a view their role may not see.
#[must_use]
pub fn unauthorized_page(view: View, role: Option<Role>, redirect_to: &str) -> String {
    let redirect_to = escape(redirect_to);
    let head = format!(
        r#"<meta http-equiv="refresh" content="{FORBIDDEN_NOTICE_SECS};url={redirect_to}">"#
    );
    let role = role.map_or("Unassigned", Role::as_str);
    let content = format!(
        r#"<div class="unauthorized p-10 text-center space-y-2">
    <h2 class="text-xl font-semibold">Unauthorized Access</h2>
    <p>You do not have the required permissions to view {label}.</p>
    <p>Your Role: <strong>{role}</strong></p>
    <p class="text-sm"><a href="{redirect_to}">Back to the dashboard</a></p>
</div>"#,
        label = view.label(),
    );
    html_shell("Unauthorized", &head, &content)
}
