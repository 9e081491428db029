use axum::response::Html;

use crate::{guard::AuthorizedSession, roles::Role};

/// NavItem
///
/// One entry of a role's side navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

pub const SETTINGS_PATH: &str = "/settings";

const ADMIN_NAV: &[NavItem] = &[
    item("Dashboard", "/admin/dashboard"),
    item("Users", "/admin/users"),
    item("Agents", "/admin/agents"),
    item("Tickets", "/admin/tickets"),
    item("Reports", "/admin/reports"),
    item("Settings", SETTINGS_PATH),
];

const AGENT_NAV: &[NavItem] = &[
    item("Dashboard", "/agent/dashboard"),
    item("My Tickets", "/agent/tickets"),
    item("Unread Replies", "/agent/unread"),
    item("Overdue", "/agent/overdue"),
    item("Resolved", "/agent/resolved"),
    item("Settings", SETTINGS_PATH),
];

const CLIENT_NAV: &[NavItem] = &[
    item("Dashboard", "/client/dashboard"),
    item("My Tickets", "/client/tickets"),
    item("New Ticket", "/client/tickets/new"),
    item("Unread Responses", "/client/unread"),
    item("Settings", SETTINGS_PATH),
];

/// The side navigation configured for `role`.
pub fn nav_items(role: Role) -> &'static [NavItem] {
    match role {
        Role::Admin => ADMIN_NAV,
        Role::Agent => AGENT_NAV,
        Role::Client => CLIENT_NAV,
    }
}

/// LayoutShell
///
/// The page frame every signed-in view renders into: top bar, the role's side
/// navigation, and a single content slot. It trusts that the route guard has already
/// admitted the visitor and performs no checks of its own.
#[derive(Debug, Clone, Copy)]
pub struct LayoutShell<'a> {
    role: Role,
    email: &'a str,
    nav: &'static [NavItem],
}

impl<'a> LayoutShell<'a> {
    pub fn for_session(session: &'a AuthorizedSession) -> Self {
        Self {
            role: session.role,
            email: &session.email,
            nav: nav_items(session.role),
        }
    }

    /// Renders the full page. `content` is trusted markup placed into the slot;
    /// `title` and `current_path` are escaped.
    pub fn render(&self, title: &str, current_path: &str, content: &str) -> Html<String> {
        let mut nav = String::new();
        for entry in self.nav {
            let class = if entry.path == current_path {
                r#" class="active" aria-current="page""#
            } else {
                ""
            };
            nav.push_str(&format!(
                r#"<li><a href="{}"{class}>{}</a></li>"#,
                escape(entry.path),
                escape(entry.label)
            ));
        }

        let body = format!(
            r#"<header class="topbar"><a class="brand" href="{home}">Support Desk</a><span class="who">{email} ({role})</span><form method="post" action="/logout"><button type="submit">Sign out</button></form></header>
<div class="frame"><nav class="sidebar sidebar-{role_key}"><ul>{nav}</ul></nav>
<main>{content}</main></div>"#,
            home = self.role.home_path(),
            email = escape(self.email),
            role = self.role.label(),
            role_key = self.role.as_str(),
        );

        document(title, &body)
    }
}

/// Wraps `body` in a complete HTML document.
pub fn document(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>{} · Support Desk</title></head>
<body>
{body}
</body></html>"#,
        escape(title)
    ))
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(role: Role) -> AuthorizedSession {
        AuthorizedSession {
            user_id: Uuid::nil(),
            email: "<b>x</b>@example.com".to_string(),
            role,
            api_token: None,
        }
    }

    #[test]
    fn every_role_has_dashboard_first_and_settings_last() {
        for role in Role::ALL {
            let nav = nav_items(role);
            assert_eq!(nav.first().map(|i| i.path), Some(role.home_path()));
            assert_eq!(nav.last().map(|i| i.path), Some(SETTINGS_PATH));
        }
    }

    #[test]
    fn render_marks_active_item_and_escapes_email() {
        let s = session(Role::Agent);
        let Html(page) = LayoutShell::for_session(&s).render("Overdue", "/agent/overdue", "<p>slot</p>");

        assert!(page.contains(r#"<a href="/agent/overdue" class="active" aria-current="page">Overdue</a>"#));
        assert!(page.contains("&lt;b&gt;x&lt;/b&gt;@example.com"));
        assert!(page.contains("<main><p>slot</p></main>"));
        assert!(!page.contains("/admin/users"));
    }

    #[test]
    fn escape_handles_quotes() {
        assert_eq!(escape(r#"a"b'c&"#), "a&quot;b&#39;c&amp;");
    }
}
