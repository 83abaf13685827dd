//! Page shells shared by every screen.

use crate::access::View;
use crate::session::{Identity, SessionStore};

/// Escape text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Bare document: head, assets, and `content` as the body.
#[must_use]
pub fn html_shell(title: &str, head_extra: &str, content: &str) -> String {
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="HOV store administration">
    <title>{title} - HOV Admin</title>
    {head_extra}
    <link rel="stylesheet" href="/static/app.css">
</head>
<body class="min-h-screen bg-background text-textPrimary antialiased">
{content}
</body>
</html>"#
    )
}

/// Dashboard chrome: sidebar with the views the operator may open, a header
/// with their identity, and `content` in the main column.
#[must_use]
pub fn dashboard_shell(
    active: View,
    identity: &Identity,
    session: &SessionStore,
    content: &str,
) -> String {
    let nav: String = View::ALL
        .into_iter()
        .filter(|view| session.has_role(view.allowed_roles()))
        .map(|view| {
            let class = if view == active {
                "nav-link active"
            } else {
                "nav-link"
            };
            format!(
                r#"<a href="{path}" class="{class}">{label}</a>"#,
                path = view.path(),
                label = view.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n                ");

    let body = format!(
        r#"<div id="app-shell" class="flex h-screen overflow-hidden">
        <aside class="sidebar w-64 shrink-0 bg-surfaceContainer flex flex-col">
            <a href="{home}" class="brand px-6 py-5 font-semibold text-lg">HOV Admin</a>
            <nav class="flex flex-col gap-1 px-3">
                {nav}
            </nav>
            <form method="post" action="/logout" class="mt-auto p-4">
                <button type="submit" class="btn btn-ghost w-full">Logout</button>
            </form>
        </aside>
        <div class="flex-1 flex flex-col overflow-hidden">
            <header class="flex items-center justify-between px-6 h-16 bg-surfaceContainer shrink-0">
                <h1 class="font-semibold text-lg">{title}</h1>
                <div class="flex items-center gap-3">
                    <span class="text-sm">{username}</span>
                    <span class="badge role-{role}">{role}</span>
                </div>
            </header>
            <main id="app" class="flex-1 overflow-y-auto px-6 py-6">
                {content}
            </main>
        </div>
    </div>"#,
        home = View::DEFAULT.path(),
        title = active.label(),
        username = escape(&identity.username),
        role = identity.effective_role(),
    );
    html_shell(active.label(), "", &body)
}

/// Inline error banner, or nothing.
#[must_use]
pub fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            r#"<div class="alert alert-error" role="alert">{}</div>"#,
            escape(message)
        ),
        None => String::new(),
    }
}
